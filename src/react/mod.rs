//! 对话层：Planner（出站消息构建与模型调用）、工具调用主循环、过程事件

pub mod events;
pub mod loop_;
pub mod planner;

pub use events::ReactEvent;
pub use loop_::{
    run_conversation, ChatOutcome, ChatSession, StopReason, DEFAULT_MAX_TOOL_ROUNDS,
    ROUND_LIMIT_ANSWER,
};
pub use planner::{Planner, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SYSTEM_PROMPT};
