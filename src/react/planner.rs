//! Planner：构建出站消息并调用模型
//!
//! 出站序列固定为：一条 system 指令 + 既有历史 + 新的 user 消息；
//! plan 在超时内调用 LlmClient（附带工具 Schema），返回最终回答或工具调用请求。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::core::AgentError;
use crate::llm::{AssistantReply, LlmClient, ToolSpec};
use crate::memory::{Conversation, Message};

/// 默认 system 指令
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for an airline called FlightAI. \
Give short, courteous answers, no more than 1 sentence. \
Always be accurate. If you don't know the answer, say so.";

/// 默认模型请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Planner：持有 LLM、system 指令与请求超时
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    request_timeout_secs: u64,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn base_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// system + history + user
    pub fn build_conversation(&self, history: &[Message], user_input: &str) -> Conversation {
        let mut conversation = Conversation::with_system(self.system_prompt.clone(), history);
        conversation.push(Message::user(user_input));
        conversation
    }

    pub async fn plan(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<AssistantReply, AgentError> {
        let secs = self.request_timeout_secs;
        match timeout(Duration::from_secs(secs), self.llm.complete(messages, tools)).await {
            Ok(result) => result.map_err(AgentError::from),
            Err(_) => Err(AgentError::LlmTimeout(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use crate::memory::Role;
    use async_trait::async_trait;

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _: &[Message], _: &[ToolSpec]) -> Result<AssistantReply, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(AssistantReply::text("late"))
        }
    }

    #[test]
    fn test_build_conversation_order() {
        let planner = Planner::new(Arc::new(MockLlmClient), "sys");
        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        let conv = planner.build_conversation(&history, "now");
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(conv.messages()[0].content, "sys");
        assert_eq!(conv.messages()[3].content, "now");
    }

    #[tokio::test]
    async fn test_plan_times_out() {
        let planner = Planner::new(Arc::new(SlowClient), "sys").with_timeout(1);
        let err = planner.plan(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmTimeout(1)));
    }
}
