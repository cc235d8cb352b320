//! HTTP API：自然语言查询 /query、对话 /chat、健康检查 /health
//!
//! 每个请求分配一个 request_id 挂到 tracing span 上，便于串联同一请求的生成与执行日志。

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::agent::{chat_outcome, AgentComponents};
use crate::memory::Message;
use crate::sql::{QueryPipeline, QueryResponse};

/// HTTP 服务共享状态：对话组件与查询管线都是只读的，可并发使用
pub struct ApiState {
    pub components: AgentComponents,
    pub pipeline: QueryPipeline,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    #[serde(default)]
    history: Vec<Message>,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/chat", post(chat))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn query(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("query", request_id = %request_id);

    // 非法 JSON 与缺少 question 一样视为没有提问
    let question = serde_json::from_slice::<QueryRequest>(&body)
        .ok()
        .and_then(|r| r.question)
        .unwrap_or_default();

    let resp = state.pipeline.answer(&question).instrument(span).await;
    query_response(resp)
}

fn query_response(resp: QueryResponse) -> Response {
    match resp.error {
        None => {
            let body = json!({
                "data": resp.data.unwrap_or_default(),
                "generated_sql": resp.generated_sql,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Some(e) if e.is_client_error() => error_body(StatusCode::BAD_REQUEST, &e.to_string()),
        Some(e) => {
            let mut body = json!({ "error": e.to_string() });
            if let Some(sql) = resp.generated_sql {
                body["generated_sql"] = Value::String(sql);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn chat(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", request_id = %request_id);

    let Some(req) = serde_json::from_slice::<ChatRequest>(&body)
        .ok()
        .filter(|r| r.message.as_deref().is_some_and(|m| !m.trim().is_empty()))
    else {
        return error_body(StatusCode::BAD_REQUEST, "No message provided.");
    };
    let message = req.message.unwrap_or_default();

    match chat_outcome(&state.components, &message, &req.history)
        .instrument(span)
        .await
    {
        Ok(outcome) => {
            let body = json!({
                "reply": outcome.answer,
                "messages": outcome.history(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, "Agent error: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::llm::{AssistantReply, ScriptedGenerator, ScriptedLlmClient};
    use crate::sql::SqliteSource;

    struct Fixture {
        router: Router,
        generator: Arc<ScriptedGenerator>,
        _dir: tempfile::TempDir,
    }

    fn fixture(sql_outputs: Vec<&str>, replies: Vec<AssistantReply>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, department TEXT, salary REAL);
             INSERT INTO employees (name, department, salary) VALUES ('Alice', 'Engineering', 90000);
             INSERT INTO employees (name, department, salary) VALUES ('Bob', 'Sales', 60000);",
        )
        .unwrap();
        drop(conn);

        let generator = Arc::new(ScriptedGenerator::new(
            sql_outputs.into_iter().map(String::from).collect(),
        ));
        let pipeline = QueryPipeline::new(Arc::new(SqliteSource::new(&path)), generator.clone());
        let llm = Arc::new(ScriptedLlmClient::new(replies));
        let components = AgentComponents::new(llm, &AppConfig::default()).unwrap();

        Fixture {
            router: create_router(Arc::new(ApiState { components, pipeline })),
            generator,
            _dir: dir,
        }
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture(vec![], vec![]);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = f.router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_query_success() {
        let f = fixture(vec!["SELECT name FROM employees WHERE department = 'Sales'"], vec![]);
        let (status, body) =
            post_json(f.router, "/query", r#"{"question": "Who works in sales?"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([{"name": "Bob"}]));
        assert_eq!(
            body["generated_sql"],
            "SELECT name FROM employees WHERE department = 'Sales'"
        );
    }

    #[tokio::test]
    async fn test_query_missing_or_invalid_question() {
        for payload in [r#"{}"#, r#"{"question": ""}"#, "not json"] {
            let f = fixture(vec!["SELECT 1"], vec![]);
            let (status, body) = post_json(f.router, "/query", payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "No question provided."}));
            assert_eq!(f.generator.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_query_execution_error_includes_sql() {
        let f = fixture(vec!["SELECT * FROM payroll"], vec![]);
        let (status, body) =
            post_json(f.router, "/query", r#"{"question": "Show payroll"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["generated_sql"], "SELECT * FROM payroll");
        assert!(body["error"].as_str().unwrap().contains("no such table"));
    }

    #[tokio::test]
    async fn test_query_generation_error_has_no_sql() {
        let f = fixture(vec![], vec![]);
        let (status, body) =
            post_json(f.router, "/query", r#"{"question": "Show payroll"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("generated_sql").is_none());
    }

    #[tokio::test]
    async fn test_chat_reply_and_messages() {
        let f = fixture(vec![], vec![AssistantReply::text("Hi, how can I help?")]);
        let (status, body) = post_json(f.router, "/chat", r#"{"message": "hello"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Hi, how can I help?");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let f = fixture(vec![], vec![]);
        let (status, body) = post_json(f.router, "/chat", r#"{"message": "  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No message provided."}));
    }
}
