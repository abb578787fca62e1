//! File-backed conversation host: every delivered message becomes one JSON line.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use quill_protocol::ConversationId;
use quill_protocol::message::MessageContent;
use quill_tui::ConversationHost;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum OutboxEntryKind {
    Reply,
    New,
}

#[derive(Serialize)]
struct OutboxRecord<'a> {
    entry: OutboxEntryKind,
    conversation_id: &'a ConversationId,
    content: &'a MessageContent,
}

pub struct JsonlHost {
    path: PathBuf,
}

impl JsonlHost {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(
        &self,
        entry: OutboxEntryKind,
        conversation_id: &ConversationId,
        content: &MessageContent,
    ) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }

        let mut line = serde_json::to_string(&OutboxRecord {
            entry,
            conversation_id,
            content,
        })
        .context("serialize outbox record")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open outbox {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to outbox {}", self.path.display()))?;
        Ok(())
    }
}

impl ConversationHost for JsonlHost {
    fn reply(
        &mut self,
        content: MessageContent,
        conversation_id: &ConversationId,
    ) -> anyhow::Result<()> {
        self.append(OutboxEntryKind::Reply, conversation_id, &content)
    }

    fn start_conversation(
        &mut self,
        content: MessageContent,
    ) -> anyhow::Result<Option<ConversationId>> {
        let conversation_id = ConversationId::new();
        self.append(OutboxEntryKind::New, &conversation_id, &content)?;
        Ok(Some(conversation_id))
    }
}
