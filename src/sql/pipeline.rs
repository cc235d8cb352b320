//! 自然语言转 SQL 问答管线
//!
//! 校验问题 -> 读取表结构（失败降级，不中断）-> 构建 prompt -> 生成 SQL -> 执行 -> 结果行。
//! 每条失败路径都落到 QueryResponse 上，不向调用方抛出；生成之后的执行失败会带上尝试执行的 SQL。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::core::QueryError;
use crate::llm::{LlmError, TextGenerator};
use crate::sql::introspect::describe;
use crate::sql::prompt::{build_sql_prompt, clean_generated_sql};
use crate::sql::source::{DataSource, SqlRow};

/// 默认生成请求超时（秒）
pub const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 60;

/// 一次问答的结果：data 与 error 恰好一个有值
#[derive(Debug)]
pub struct QueryResponse {
    pub data: Option<Vec<SqlRow>>,
    pub generated_sql: Option<String>,
    pub error: Option<QueryError>,
}

impl QueryResponse {
    fn success(sql: String, rows: Vec<SqlRow>) -> Self {
        Self {
            data: Some(rows),
            generated_sql: Some(sql),
            error: None,
        }
    }

    fn failure(error: QueryError) -> Self {
        Self {
            data: None,
            generated_sql: error.generated_sql().map(String::from),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct QueryPipeline {
    source: Arc<dyn DataSource>,
    generator: Arc<dyn TextGenerator>,
    generate_timeout_secs: u64,
}

impl QueryPipeline {
    pub fn new(source: Arc<dyn DataSource>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            source,
            generator,
            generate_timeout_secs: DEFAULT_GENERATE_TIMEOUT_SECS,
        }
    }

    pub fn with_generate_timeout(mut self, secs: u64) -> Self {
        self.generate_timeout_secs = secs;
        self
    }

    pub async fn answer(&self, question: &str) -> QueryResponse {
        match self.run(question).await {
            Ok((sql, rows)) => QueryResponse::success(sql, rows),
            Err(e) => {
                if e.is_client_error() {
                    tracing::debug!(error = %e, "rejected query");
                } else {
                    tracing::warn!(error = %e, sql = ?e.generated_sql(), "query failed");
                }
                QueryResponse::failure(e)
            }
        }
    }

    async fn run(&self, question: &str) -> Result<(String, Vec<SqlRow>), QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::InvalidInput);
        }

        let schema = describe(self.source.as_ref()).await;
        let prompt = build_sql_prompt(&schema, question);

        let secs = self.generate_timeout_secs;
        let raw = timeout(Duration::from_secs(secs), self.generator.generate(&prompt))
            .await
            .map_err(|_| LlmError::Timeout(secs))??;

        let sql = clean_generated_sql(&raw);
        if sql.is_empty() {
            return Err(QueryError::GenerationFailed);
        }
        tracing::info!(sql = %sql, degraded_schema = schema.degraded, "generated SQL");

        let rows = self
            .source
            .query(&sql)
            .await
            .map_err(|e| QueryError::ExecutionFailed {
                sql: sql.clone(),
                message: e.to_string(),
            })?;
        tracing::info!(rows = rows.len(), "query executed");

        Ok((sql, rows))
    }
}
