//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! - MockLlmClient：回显最后一条 User 消息作为最终回答；
//! - ScriptedLlmClient / ScriptedGenerator：按脚本依次返回预设结果，并记录每次调用的输入，
//!   供测试断言调用次数与发送给模型的上下文。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{AssistantReply, LlmClient, LlmError, TextGenerator, ToolSpec};
use crate::memory::{Message, Role};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<AssistantReply, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(AssistantReply::text(format!("Echo from Mock: {}", last_user)))
    }
}

/// 脚本化对话客户端：每次 complete 弹出一条预设回复；脚本耗尽时返回 InvalidResponse
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<AssistantReply>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new(replies: Vec<AssistantReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用时发送给模型的完整消息序列
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<AssistantReply, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or_else(|| LlmError::InvalidResponse("mock script exhausted".to_string()))
    }
}

/// 脚本化文本生成：每次 generate 弹出一条预设输出
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    outputs: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(outputs: Vec<String>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.outputs
            .lock()
            .ok()
            .and_then(|mut o| o.pop_front())
            .ok_or_else(|| LlmError::InvalidResponse("mock script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_last_user_message() {
        let messages = vec![Message::system("sys"), Message::user("hello")];
        let reply = MockLlmClient.complete(&messages, &[]).await.unwrap();
        assert_eq!(reply.content, "Echo from Mock: hello");
        assert!(reply.is_final());
    }

    #[tokio::test]
    async fn test_scripted_client_records_and_exhausts() {
        let client = ScriptedLlmClient::new(vec![AssistantReply::text("one")]);
        let first = client.complete(&[Message::user("a")], &[]).await.unwrap();
        assert_eq!(first.content, "one");
        assert!(client.complete(&[Message::user("b")], &[]).await.is_err());
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.calls()[1][0].content, "b");
    }
}
