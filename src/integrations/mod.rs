//! 外部集成：HTTP API（需 web feature）

#[cfg(feature = "web")]
pub mod http_api;
