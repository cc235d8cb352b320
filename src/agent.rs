//! Headless Agent 运行时
//!
//! 供 REPL 与 HTTP API 调用的无界面逻辑：
//! create_agent_components 构建 Planner / ActionExecutor，
//! chat 对单条用户输入跑工具调用循环并返回最终回复，
//! create_query_pipeline 构建自然语言转 SQL 管线。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::{AgentError, RegistryError};
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OllamaGenerator, OpenAiClient};
use crate::memory::Message;
use crate::react::{run_conversation, ChatOutcome, ChatSession, Planner, ReactEvent};
use crate::sql::{QueryPipeline, SqliteSource};
use crate::tools::{ActionExecutor, ActionRegistry};

/// Ollama 的 OpenAI 兼容端点
pub const OLLAMA_OPENAI_BASE_URL: &str = "http://localhost:11434/v1";

/// 根据 [llm].provider 与环境变量选择对话模型后端；缺少 Key 时退回 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();
    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();

    match provider.as_str() {
        "deepseek" if has_deepseek_key || has_openai_key => {
            tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
            Arc::new(create_deepseek_client(Some(&cfg.llm.model)))
        }
        "openai" if has_openai_key => {
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                None,
            ))
        }
        "ollama" => {
            let base = cfg.llm.base_url.as_deref().unwrap_or(OLLAMA_OPENAI_BASE_URL);
            tracing::info!("Using Ollama LLM ({}) at {}", cfg.llm.model, base);
            // 本地端点不校验 Key，给一个占位值避免回落到 OPENAI_API_KEY
            Arc::new(OpenAiClient::new(Some(base), &cfg.llm.model, Some("ollama")))
        }
        "mock" => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient)
        }
        _ => {
            tracing::warn!(provider = %provider, "No API key set or provider unknown, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}

/// 预构建的对话组件，可多会话共享
pub struct AgentComponents {
    pub planner: Planner,
    pub executor: ActionExecutor,
    pub max_tool_rounds: usize,
}

impl AgentComponents {
    pub fn new(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Result<Self, RegistryError> {
        let registry = ActionRegistry::standard()?;
        Ok(Self {
            planner: Planner::new(llm, cfg.chat.system_prompt.clone())
                .with_timeout(cfg.llm.request_timeout_secs),
            executor: ActionExecutor::new(registry),
            max_tool_rounds: cfg.chat.max_tool_rounds,
        })
    }

    fn session(&self) -> ChatSession<'_> {
        ChatSession::new(&self.planner, &self.executor).with_max_tool_rounds(self.max_tool_rounds)
    }
}

/// 从配置创建对话组件：LLM 后端 + 标准航班工具
pub fn create_agent_components(cfg: &AppConfig) -> Result<AgentComponents, RegistryError> {
    let llm = create_llm_from_config(cfg);
    AgentComponents::new(llm, cfg)
}

/// 处理单条用户消息，返回最终回复文本
pub async fn chat(
    components: &AgentComponents,
    message: &str,
    history: &[Message],
) -> Result<String, AgentError> {
    Ok(chat_outcome(components, message, history).await?.answer)
}

/// 同 chat，但返回完整消息序列，调用方可据此延续多轮对话
pub async fn chat_outcome(
    components: &AgentComponents,
    message: &str,
    history: &[Message],
) -> Result<ChatOutcome, AgentError> {
    run_conversation(&components.session(), history, message).await
}

/// 流式处理：通过 event_tx 推送 Thinking / ToolCall / Observation / MessageDone
pub async fn chat_stream(
    components: &AgentComponents,
    message: &str,
    history: &[Message],
    event_tx: mpsc::UnboundedSender<ReactEvent>,
) -> Result<ChatOutcome, AgentError> {
    let session = components.session().with_event_tx(&event_tx);
    run_conversation(&session, history, message).await
}

/// 从配置创建 SQL 问答管线：[database] 的 SQLite 文件 + [generate] 的生成端点
pub fn create_query_pipeline(cfg: &AppConfig) -> QueryPipeline {
    let source = SqliteSource::new(&cfg.database.path).with_timeout(cfg.database.query_timeout_secs);
    let generator = OllamaGenerator::new(Some(&cfg.generate.endpoint), &cfg.generate.model);
    tracing::info!(
        database = %cfg.database.path.display(),
        endpoint = %cfg.generate.endpoint,
        model = %cfg.generate.model,
        "query pipeline ready"
    );
    QueryPipeline::new(Arc::new(source), Arc::new(generator))
        .with_generate_timeout(cfg.generate.timeout_secs)
}
