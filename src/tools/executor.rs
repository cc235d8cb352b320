//! 动作执行器
//!
//! 持有只读的 ActionRegistry，execute(requests) 按输入顺序为每个请求生成一条 tool 消息
//! （tool_call_id 与 name 回填）。未知动作、参数错误都转为结构化的错误内容而不是 Err，
//! 保证对话可以继续；每次调用输出结构化审计日志（JSON）。

use std::time::Instant;

use serde_json::{json, Value};

use crate::core::ActionError;
use crate::llm::ToolSpec;
use crate::memory::{Message, ToolCallRequest};
use crate::tools::ActionRegistry;

pub struct ActionExecutor {
    registry: ActionRegistry,
}

impl ActionExecutor {
    pub fn new(registry: ActionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.registry.tool_specs()
    }

    /// 执行一轮工具调用；返回条数与 requests 相同，顺序一致
    pub fn execute(&self, requests: &[ToolCallRequest]) -> Vec<Message> {
        requests.iter().map(|r| self.execute_one(r)).collect()
    }

    pub fn execute_one(&self, request: &ToolCallRequest) -> Message {
        let start = Instant::now();
        let result = self.dispatch(request);

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        let audit = json!({
            "event": "tool_audit",
            "tool": request.action_name,
            "call_id": request.id,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_us": start.elapsed().as_micros() as u64,
            "args_preview": args_preview(&request.arguments),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        let content = match result {
            Ok(value) => value.to_string(),
            Err(e) => error_content(&request.action_name, &e),
        };
        Message::tool_result(request.id.clone(), request.action_name.clone(), content)
    }

    fn dispatch(&self, request: &ToolCallRequest) -> Result<Value, ActionError> {
        let spec = self
            .registry
            .get(&request.action_name)
            .ok_or_else(|| ActionError::UnknownAction(request.action_name.clone()))?;
        spec.action.invoke(&request.arguments)
    }
}

fn error_content(action: &str, err: &ActionError) -> String {
    json!({
        "error": err.kind(),
        "action": action,
        "detail": err.to_string(),
    })
    .to_string()
}

const ARGS_PREVIEW_CHARS: usize = 200;

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > ARGS_PREVIEW_CHARS {
        format!("{}...", s.chars().take(ARGS_PREVIEW_CHARS).collect::<String>())
    } else {
        s
    }
}
