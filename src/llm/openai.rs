//! OpenAI 兼容 API 客户端
//!
//! 直接以 reqwest 调用任意 OpenAI 兼容的 `/chat/completions` 端点（可配置 base_url）；
//! 支持 OpenAI、DeepSeek、Ollama 的 /v1 兼容层等。请求携带 tools，响应中的 tool_calls
//! 转为 ToolCallRequest（arguments 为 JSON 字符串，解析失败时原样保留）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::{AssistantReply, LlmClient, LlmError, ToolSpec};
use crate::memory::{Message, Role, ToolCallRequest};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI 兼容客户端：持有 HTTP Client、base_url、model 与可选 API Key
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        Self {
            http: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionSpec<'a>,
}

#[derive(Serialize)]
struct WireFunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

fn to_wire(m: &Message) -> WireMessage {
    let tool_calls: Vec<WireToolCall> = m
        .tool_calls
        .iter()
        .map(|tc| WireToolCall {
            id: tc.id.clone(),
            kind: function_kind(),
            function: WireFunction {
                name: tc.action_name.clone(),
                arguments: tc.arguments.to_string(),
            },
        })
        .collect();
    // 带 tool_calls 的 assistant 消息：无文本时 content 为 null
    let content = if m.content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(m.content.clone())
    };
    WireMessage {
        role: m.role,
        content,
        tool_call_id: m.tool_call_id.clone(),
        tool_calls,
    }
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn from_wire(m: WireMessage) -> AssistantReply {
    AssistantReply {
        content: m.content.unwrap_or_default(),
        tool_calls: m
            .tool_calls
            .into_iter()
            .map(|tc| {
                ToolCallRequest::new(tc.id, tc.function.name, parse_arguments(&tc.function.arguments))
            })
            .collect(),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<AssistantReply, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(to_wire).collect(),
            tools: tools
                .iter()
                .map(|t| WireTool {
                    kind: "function",
                    function: WireFunctionSpec {
                        name: &t.name,
                        description: &t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect(),
        };

        let mut builder = self.http.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = resp.json().await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in completion".to_string()))?;

        Ok(from_wire(choice.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_with_tool_calls() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function",
                         "function": {"name": "get_ticket_price", "arguments": "{\"destination_city\":\"London\"}"}},
                        {"id": "call_b", "type": "function",
                         "function": {"name": "get_ticket_availability", "arguments": "not json"}}
                    ]
                }
            }]
        });
        let resp: ChatResponse = serde_json::from_value(raw).unwrap();
        let reply = from_wire(resp.choices.into_iter().next().unwrap().message);

        assert!(!reply.is_final());
        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls[0].id, "call_a");
        assert_eq!(reply.tool_calls[0].arguments, json!({"destination_city": "London"}));
        assert_eq!(reply.tool_calls[1].arguments, Value::String("not json".to_string()));
    }

    #[test]
    fn test_final_text_response() {
        let raw = json!({"choices": [{"message": {"role": "assistant", "content": "Hi there"}}]});
        let resp: ChatResponse = serde_json::from_value(raw).unwrap();
        let reply = from_wire(resp.choices.into_iter().next().unwrap().message);
        assert_eq!(reply, AssistantReply::text("Hi there"));
    }

    #[test]
    fn test_outbound_tool_turn_shape() {
        let call = ToolCallRequest::new("call_a", "get_ticket_price", json!({"destination_city": "Paris"}));
        let assistant = serde_json::to_value(to_wire(&Message::assistant_tool_calls("", vec![call]))).unwrap();
        assert_eq!(assistant["content"], Value::Null);
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            r#"{"destination_city":"Paris"}"#
        );

        let tool = serde_json::to_value(to_wire(&Message::tool_result("call_a", "get_ticket_price", "{}"))).unwrap();
        assert_eq!(tool, json!({"role": "tool", "content": "{}", "tool_call_id": "call_a"}));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new(Some("http://localhost:11434/v1/"), "llama3.1", Some("k"));
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }
}
