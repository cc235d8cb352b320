//! 记忆层：对话消息、一次编排内的对话历史、JSON 持久化

pub mod conversation;
pub mod persistence;

pub use conversation::{Conversation, Message, Role, ToolCallRequest};
pub use persistence::ConversationPersistence;
