//! 错误类型
//!
//! - AgentError：对话编排中会返回给调用方的错误（模型调用失败 / 超时）；
//! - ActionError：单个工具调用失败，转为 tool 消息内容回传给模型，不中断对话；
//! - RegistryError：动作注册表构建时校验失败；
//! - QueryError：SQL 问答管线的失败分类，对应 HTTP 400 / 500。

use thiserror::Error;

use crate::llm::LlmError;

/// 对话编排错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM request timed out after {0}s")]
    LlmTimeout(u64),
}

/// 单个工具调用失败（非致命，回传给模型）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Malformed arguments for {action}: {detail}")]
    MalformedArguments { action: String, detail: String },
}

impl ActionError {
    /// 写入 tool 消息的机器可读错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::UnknownAction(_) => "unknown_action",
            ActionError::MalformedArguments { .. } => "malformed_arguments",
        }
    }
}

/// 注册表构建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    #[error("Invalid parameter schema for {action}: {reason}")]
    InvalidSchema { action: String, reason: String },
}

/// SQL 问答管线错误
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No question provided.")]
    InvalidInput,

    #[error("SQL generation failed: the model returned no SQL")]
    GenerationFailed,

    #[error("SQL generation failed: {0}")]
    Model(#[from] LlmError),

    #[error("SQL execution failed: {message}")]
    ExecutionFailed { sql: String, message: String },
}

impl QueryError {
    /// 用户可修正的输入错误（400）；其余均为 500
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidInput)
    }

    /// 失败发生在生成之后时返回尝试执行的 SQL
    pub fn generated_sql(&self) -> Option<&str> {
        match self {
            QueryError::ExecutionFailed { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
