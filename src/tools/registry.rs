//! 动作注册表
//!
//! 动作是封闭集合（Action 枚举），注册表在启动时构建并校验：名称唯一、参数 Schema 为
//! `type: object` 且 `additionalProperties: false`、required 字段均在 properties 中声明。
//! 构建后只读，可在并发请求间共享。

use std::collections::HashMap;

use serde_json::Value;

use crate::core::{ActionError, RegistryError};
use crate::llm::ToolSpec;
use crate::tools::flights::{self, AvailabilityReport, PriceQuote};
use crate::tools::schema::{parameters_schema, DestinationArgs};

/// 可供模型请求的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TicketPrice,
    TicketAvailability,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::TicketPrice, Action::TicketAvailability];

    pub fn name(&self) -> &'static str {
        match self {
            Action::TicketPrice => "get_ticket_price",
            Action::TicketAvailability => "get_ticket_availability",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Action::TicketPrice => {
                "Get the price of a return ticket to the destination city. Call this whenever \
                 you need to know the ticket price, for example when a customer asks \
                 'How much is a ticket to this city'"
            }
            Action::TicketAvailability => {
                "Check whether return tickets to the destination city are available. Answers \
                 yes, no or unknown."
            }
        }
    }

    pub fn parameters_schema(&self) -> Value {
        match self {
            Action::TicketPrice | Action::TicketAvailability => {
                parameters_schema::<DestinationArgs>()
            }
        }
    }

    /// 按参数记录解析 args 并执行，返回可序列化的结果
    pub fn invoke(&self, args: &Value) -> Result<Value, ActionError> {
        match self {
            Action::TicketPrice => {
                let args: DestinationArgs = self.parse_args(args)?;
                let quote = PriceQuote {
                    destination_city: &args.destination_city,
                    price: flights::ticket_price(&args.destination_city),
                };
                Ok(serde_json::to_value(quote).unwrap_or(Value::Null))
            }
            Action::TicketAvailability => {
                let args: DestinationArgs = self.parse_args(args)?;
                let report = AvailabilityReport {
                    destination_city: &args.destination_city,
                    availability: flights::ticket_availability(&args.destination_city),
                };
                Ok(serde_json::to_value(report).unwrap_or(Value::Null))
            }
        }
    }

    fn parse_args<T: serde::de::DeserializeOwned>(&self, args: &Value) -> Result<T, ActionError> {
        if !args.is_object() {
            return Err(ActionError::MalformedArguments {
                action: self.name().to_string(),
                detail: format!("expected a JSON object, got {}", args),
            });
        }
        serde_json::from_value(args.clone()).map_err(|e| ActionError::MalformedArguments {
            action: self.name().to_string(),
            detail: e.to_string(),
        })
    }
}

/// 注册项：名称、描述、参数 Schema 与对应的动作
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub action: Action,
}

impl From<Action> for ActionSpec {
    fn from(action: Action) -> Self {
        Self {
            name: action.name().to_string(),
            description: action.description().to_string(),
            parameters: action.parameters_schema(),
            action,
        }
    }
}

/// 动作注册表：保持注册顺序，按名称查找
#[derive(Debug)]
pub struct ActionRegistry {
    specs: Vec<ActionSpec>,
    index: HashMap<String, usize>,
}

impl ActionRegistry {
    /// 注册全部参考动作
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(Action::ALL)
    }

    pub fn new(actions: impl IntoIterator<Item = Action>) -> Result<Self, RegistryError> {
        Self::from_specs(actions.into_iter().map(ActionSpec::from))
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ActionSpec>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            specs: Vec::new(),
            index: HashMap::new(),
        };
        for spec in specs {
            validate_schema(&spec)?;
            if registry.index.contains_key(&spec.name) {
                return Err(RegistryError::DuplicateAction(spec.name));
            }
            registry.index.insert(spec.name.clone(), registry.specs.len());
            registry.specs.push(spec);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ActionSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// 声明给模型的工具列表（与注册顺序一致）
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.specs
            .iter()
            .map(|s| ToolSpec {
                name: s.name.clone(),
                description: s.description.clone(),
                parameters: s.parameters.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn validate_schema(spec: &ActionSpec) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidSchema {
        action: spec.name.clone(),
        reason: reason.to_string(),
    };

    let schema = spec
        .parameters
        .as_object()
        .ok_or_else(|| invalid("schema is not an object"))?;
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(invalid("type must be \"object\""));
    }
    if schema.get("additionalProperties") != Some(&Value::Bool(false)) {
        return Err(invalid("additionalProperties must be false"));
    }
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing properties"))?;
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required {
            let field = field.as_str().ok_or_else(|| invalid("required entries must be strings"))?;
            if !properties.contains_key(field) {
                return Err(invalid(&format!("required field `{}` is not declared", field)));
            }
        }
    }
    Ok(())
}
