//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BEE__*` 覆盖（双下划线表示嵌套，如 `BEE__LLM__PROVIDER=ollama`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::llm::DEFAULT_GENERATE_ENDPOINT;
use crate::react::{DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SYSTEM_PROMPT};
use crate::sql::{DEFAULT_GENERATE_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub generate: GenerateSection,
    pub database: DatabaseSection,
    pub chat: ChatSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：对话模型后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / deepseek / ollama / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// [generate] 段：SQL 生成端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerateSection {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATE_ENDPOINT.to_string(),
            model: "llama3".to_string(),
            timeout_secs: DEFAULT_GENERATE_TIMEOUT_SECS,
        }
    }
}

/// [database] 段：SQLite 文件路径与单条 SQL 超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: PathBuf,
    pub query_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.db"),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// [chat] 段：工具轮数上限、system 指令、历史持久化文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    pub max_tool_rounds: usize,
    pub system_prompt: String,
    /// REPL 历史文件；未设置时不持久化
    pub history_path: Option<PathBuf>,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_path: None,
        }
    }
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

/// 默认配置文件的查找位置（不含扩展名），取第一个存在的
const DEFAULT_CONFIG_CANDIDATES: [&str; 3] = ["config/default", "../config/default", "default"];

fn default_config_file() -> Option<&'static str> {
    DEFAULT_CONFIG_CANDIDATES
        .into_iter()
        .find(|stem| Path::new(&format!("{stem}.toml")).is_file())
}

/// 加载配置，后加入的源覆盖先加入的：默认 TOML、显式文件（存在时）、`BEE__*` 环境变量。
/// 三者都缺省时得到 `AppConfig::default()`。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let defaults = default_config_file()
        .map(|stem| config::File::with_name(stem).required(false));
    let explicit = config_path
        .filter(|p| p.is_file())
        .map(|p| config::File::from(p).required(false));
    let env = config::Environment::with_prefix("BEE")
        .separator("__")
        .try_parsing(true);

    let mut builder = config::Config::builder();
    for file in defaults.into_iter().chain(explicit) {
        builder = builder.add_source(file);
    }
    builder.add_source(env).build()?.try_deserialize()
}
