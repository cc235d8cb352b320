//! 对话过程事件：用于 REPL / 前端展示工具调用、观察与最终回复

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    /// 调用模型（第几轮工具调用之后）
    Thinking { round: usize, max_rounds: usize },
    /// 模型请求调用工具
    ToolCall {
        id: String,
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    Observation { id: String, tool: String, preview: String },
    /// 工具轮数达到上限，对话失败关闭
    RoundLimitReached { max_rounds: usize },
    /// 最终回复
    MessageDone { text: String },
}
