//! 本地生成端点客户端（Ollama `/api/generate`）
//!
//! 请求体 `{"model", "prompt", "stream": false}`，响应取 `response` 字段；
//! 字段缺失按空串返回，由 SQL 管线判定为生成失败。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm::{LlmError, TextGenerator};

/// 本地生成端点默认地址
pub const DEFAULT_GENERATE_ENDPOINT: &str = "http://localhost:11434/api/generate";

pub struct OllamaGenerator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl OllamaGenerator {
    pub fn new(endpoint: Option<&str>, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.unwrap_or(DEFAULT_GENERATE_ENDPOINT).to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let resp = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = resp.json().await?;
        Ok(body.response.unwrap_or_default())
    }
}
