//! 工具调用对话主循环
//!
//! 状态机：AwaitingModel -> (Final | ToolsRequested)；ToolsRequested -> 执行全部工具 -> AwaitingModel。
//! 一轮中模型请求的每个工具调用都必须得到一条 tool 消息后才会再次调用模型；
//! 工具轮数超过上限时失败关闭，返回固定的「无法完成」回答。
//! 可选 event_tx：向 REPL / 前端推送 Thinking / ToolCall / Observation / MessageDone。

use tokio::sync::mpsc::UnboundedSender;

use crate::core::AgentError;
use crate::llm::AssistantReply;
use crate::memory::Message;
use crate::react::{Planner, ReactEvent};
use crate::tools::ActionExecutor;

/// 单次对话内最多执行的工具轮数，防止模型无限请求工具
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;
/// 超过工具轮数上限时的回答
pub const ROUND_LIMIT_ANSWER: &str =
    "Sorry, I could not complete this request. Please try rephrasing your question.";
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 对话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 模型给出最终回答
    Final,
    /// 工具轮数达到上限
    RoundLimit,
}

/// 对话执行结果：最终回复与完整消息序列（含 system 指令）
#[derive(Debug)]
pub struct ChatOutcome {
    pub answer: String,
    pub messages: Vec<Message>,
    pub tool_rounds: usize,
    pub stop: StopReason,
}

impl ChatOutcome {
    /// 去掉开头 system 指令后的历史，可作为下一次调用的 history
    pub fn history(&self) -> &[Message] {
        match self.messages.first() {
            Some(m) if m.role == crate::memory::Role::System => &self.messages[1..],
            _ => &self.messages,
        }
    }
}

/// 对话会话配置
pub struct ChatSession<'a> {
    pub planner: &'a Planner,
    pub executor: &'a ActionExecutor,
    pub max_tool_rounds: usize,
    pub event_tx: Option<&'a UnboundedSender<ReactEvent>>,
}

impl<'a> ChatSession<'a> {
    pub fn new(planner: &'a Planner, executor: &'a ActionExecutor) -> Self {
        Self {
            planner,
            executor,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            event_tx: None,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<ReactEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, ev: ReactEvent) {
        if let Some(t) = self.event_tx {
            let _ = t.send(ev);
        }
    }
}

enum LoopState {
    AwaitingModel,
    ToolsRequested(AssistantReply),
    Final(String),
}

/// 执行一次对话：history 不含 system 指令，由 Planner 统一加在开头
pub async fn run_conversation(
    session: &ChatSession<'_>,
    history: &[Message],
    user_input: &str,
) -> Result<ChatOutcome, AgentError> {
    let planner = session.planner;
    let executor = session.executor;
    let tools = executor.tool_specs();
    let mut conversation = planner.build_conversation(history, user_input);
    let mut rounds = 0;
    let mut state = LoopState::AwaitingModel;

    loop {
        state = match state {
            LoopState::AwaitingModel => {
                session.send_event(ReactEvent::Thinking {
                    round: rounds,
                    max_rounds: session.max_tool_rounds,
                });
                let reply = planner.plan(conversation.messages(), &tools).await?;
                if reply.is_final() {
                    LoopState::Final(reply.content)
                } else {
                    LoopState::ToolsRequested(reply)
                }
            }
            LoopState::ToolsRequested(reply) => {
                if rounds >= session.max_tool_rounds {
                    tracing::warn!(
                        max_rounds = session.max_tool_rounds,
                        pending = reply.tool_calls.len(),
                        "tool round limit reached, giving up"
                    );
                    session.send_event(ReactEvent::RoundLimitReached {
                        max_rounds: session.max_tool_rounds,
                    });
                    conversation.push(Message::assistant(ROUND_LIMIT_ANSWER));
                    return Ok(ChatOutcome {
                        answer: ROUND_LIMIT_ANSWER.to_string(),
                        messages: conversation.into_messages(),
                        tool_rounds: rounds,
                        stop: StopReason::RoundLimit,
                    });
                }
                rounds += 1;

                for tc in &reply.tool_calls {
                    tracing::info!(
                        round = rounds,
                        tool = %tc.action_name,
                        args = %tc.arguments,
                        "tool call requested"
                    );
                    session.send_event(ReactEvent::ToolCall {
                        id: tc.id.clone(),
                        tool: tc.action_name.clone(),
                        args: tc.arguments.clone(),
                    });
                }

                let results = executor.execute(&reply.tool_calls);
                debug_assert_eq!(results.len(), reply.tool_calls.len());

                for msg in &results {
                    session.send_event(ReactEvent::Observation {
                        id: msg.tool_call_id.clone().unwrap_or_default(),
                        tool: msg.name.clone().unwrap_or_default(),
                        preview: preview(&msg.content),
                    });
                }

                // 先写入 assistant 的工具调用消息，再按请求顺序写入全部结果
                conversation.push(Message::assistant_tool_calls(reply.content, reply.tool_calls));
                conversation.extend(results);
                LoopState::AwaitingModel
            }
            LoopState::Final(answer) => {
                session.send_event(ReactEvent::MessageDone {
                    text: answer.clone(),
                });
                conversation.push(Message::assistant(answer.clone()));
                return Ok(ChatOutcome {
                    answer,
                    messages: conversation.into_messages(),
                    tool_rounds: rounds,
                    stop: StopReason::Final,
                });
            }
        };
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!("{}...", s.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}
