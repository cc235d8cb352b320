//! Bee Assist - 航班助手对话与自然语言 SQL 查询
//!
//! 模块划分：
//! - **agent**: 无头运行时，从配置组装对话组件与查询管线
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 各层错误类型
//! - **integrations**: HTTP API（/query、/chat、/health）
//! - **llm**: 模型客户端抽象与实现（OpenAI 兼容 / DeepSeek / Ollama / Mock）
//! - **memory**: 对话消息与历史持久化
//! - **observability**: tracing 日志初始化
//! - **react**: Planner 与工具调用主循环
//! - **sql**: 表结构描述、SQL 生成 prompt、问答管线、SQLite 数据源
//! - **tools**: 航班工具（票价、余票）注册表与执行器

pub mod agent;
pub mod config;
pub mod core;
pub mod integrations;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod sql;
pub mod tools;
