//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Ollama 生成端点 / Mock）

pub mod deepseek;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use mock::{MockLlmClient, ScriptedGenerator, ScriptedLlmClient};
pub use ollama::{OllamaGenerator, DEFAULT_GENERATE_ENDPOINT};
pub use openai::{OpenAiClient, OPENAI_BASE_URL};
pub use traits::{AssistantReply, LlmClient, LlmError, TextGenerator, ToolSpec};
