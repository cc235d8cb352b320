//! DeepSeek 预设：OpenAI 兼容端点 + deepseek-chat（支持 function calling）

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// Key 取 `DEEPSEEK_API_KEY`，没有时由 OpenAiClient 回落到 `OPENAI_API_KEY`；
/// 模型未指定时用 `DEEPSEEK_MODEL` 或 deepseek-chat
pub fn create_deepseek_client(model: Option<&str>) -> OpenAiClient {
    let model = match model {
        Some(m) => m.to_string(),
        None => std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEEPSEEK_CHAT.to_string()),
    };
    let key = std::env::var("DEEPSEEK_API_KEY").ok();
    OpenAiClient::new(Some(DEEPSEEK_BASE_URL), &model, key.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_model_wins() {
        let client = create_deepseek_client(Some("deepseek-reasoner"));
        assert_eq!(client.model(), "deepseek-reasoner");
    }
}
