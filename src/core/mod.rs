//! 核心层：错误分类

pub mod error;

pub use error::{ActionError, AgentError, QueryError, RegistryError};
