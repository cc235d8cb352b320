//! bee-query-server：自然语言查询与对话 HTTP 服务
//!
//! 接口:
//! - POST /query  {"question": "..."} -> {"data": [...], "generated_sql": "..."}
//! - POST /chat   {"message": "...", "history": [...]} -> {"reply": "...", "messages": [...]}
//! - GET  /health -> OK
//!
//! 启动: cargo run --bin bee-query-server（监听地址见 [server].bind）

use std::sync::Arc;

use anyhow::Context;
use bee_assist::agent::{create_agent_components, create_query_pipeline};
use bee_assist::config::load_config;
use bee_assist::integrations::http_api::{create_router, ApiState};
use bee_assist::observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    if !cfg.database.path.exists() {
        tracing::warn!(
            path = %cfg.database.path.display(),
            "database file not found, queries will fail until it exists"
        );
    }

    let state = Arc::new(ApiState {
        components: create_agent_components(&cfg).context("Failed to build action registry")?,
        pipeline: create_query_pipeline(&cfg),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!("Bee query server listening on http://{}", cfg.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
