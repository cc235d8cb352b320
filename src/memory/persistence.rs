//! 对话持久化
//!
//! 将对话历史写入/从 JSON 文件加载，供 REPL 跨进程恢复历史（可选使用）。

use std::path::Path;

use crate::memory::Message;

/// 简单的文件持久化：单文件 JSON，消息结构与 Message 的 serde 形式一致
#[derive(Debug)]
pub struct ConversationPersistence {
    path: std::path::PathBuf,
}

impl ConversationPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从 JSON 文件加载对话历史；文件不存在时返回空 Vec
    pub fn load(&self) -> anyhow::Result<Vec<Message>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let messages: Vec<Message> = serde_json::from_str(&data)?;
        Ok(messages)
    }

    /// 将对话历史写入 JSON 文件；父目录不存在时自动创建
    pub fn save(&self, messages: &[Message]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(messages)?)?;
        Ok(())
    }
}
