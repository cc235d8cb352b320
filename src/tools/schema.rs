//! 工具参数 JSON Schema 生成（schemars 自动生成，声明给模型）
//!
//! 参数记录同时用于 serde 解析：`deny_unknown_fields` 对应 Schema 中的
//! `additionalProperties: false`，缺少必填字段即解析失败。

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

/// 按目的地城市查询的参数（两个参考动作共用）
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DestinationArgs {
    /// The city that the customer wants to travel to
    pub destination_city: String,
}

/// 生成参数 Schema：去掉根上的 `$schema` 与 `title`，只保留模型需要的对象描述
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}
