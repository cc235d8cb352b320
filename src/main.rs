//! bee-assist：航班助手对话 REPL
//!
//! 每行输入作为一条用户消息，跑工具调用循环后输出回复；
//! 历史在多轮之间保留，配置了 [chat].history_path 时在退出后也会保留。
//! 输入 /reset 清空历史，/quit 或 EOF 退出。

use anyhow::Context;
use bee_assist::agent::{chat_stream, create_agent_components};
use bee_assist::config::load_config;
use bee_assist::memory::{ConversationPersistence, Message};
use bee_assist::observability;
use bee_assist::react::ReactEvent;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let components = create_agent_components(&cfg).context("Failed to build action registry")?;

    let persistence = cfg.chat.history_path.as_ref().map(ConversationPersistence::new);
    let mut history: Vec<Message> = match &persistence {
        Some(p) => p
            .load()
            .with_context(|| format!("Failed to load history from {}", p.path().display()))?,
        None => Vec::new(),
    };
    if !history.is_empty() {
        tracing::info!(messages = history.len(), "restored conversation history");
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                history.clear();
                save_history(persistence.as_ref(), &history);
                stdout.write_all(b"(history cleared)\n").await?;
                continue;
            }
            _ => {}
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                match ev {
                    ReactEvent::ToolCall { tool, args, .. } => eprintln!("  [tool] {} {}", tool, args),
                    ReactEvent::Observation { preview, .. } => eprintln!("  [result] {}", preview),
                    ReactEvent::RoundLimitReached { max_rounds } => {
                        eprintln!("  [stopped after {} tool rounds]", max_rounds)
                    }
                    _ => {}
                }
            }
        });

        let result = chat_stream(&components, input, &history, tx).await;
        let _ = printer.await;

        match result {
            Ok(outcome) => {
                stdout
                    .write_all(format!("{}\n", outcome.answer).as_bytes())
                    .await?;
                history = outcome.history().to_vec();
                save_history(persistence.as_ref(), &history);
            }
            Err(e) => {
                tracing::error!("Agent error: {}", e);
                stdout.write_all(format!("Error: {}\n", e).as_bytes()).await?;
            }
        }
    }

    Ok(())
}

fn save_history(persistence: Option<&ConversationPersistence>, history: &[Message]) {
    if let Some(p) = persistence {
        if let Err(e) = p.save(history) {
            tracing::warn!(path = %p.path().display(), "Failed to save history: {:#}", e);
        }
    }
}
