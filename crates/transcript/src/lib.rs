//! Transcript persistence — durable JSON snapshots of a conversation.
//!
//! On every message append the orchestrator saves the full ordered message
//! list, keyed by session id. The file is the human-inspectable record of
//! the conversation: pretty-printed JSON, one file per session, rewritten
//! on each append.

use async_trait::async_trait;
use ferrochat_core::error::TranscriptError;
use ferrochat_core::message::Conversation;
use ferrochat_core::transcript::TranscriptStore;
use std::path::PathBuf;
use tracing::debug;

/// A file-backed transcript store: `<dir>/<session_id>.json`.
///
/// The directory is created on first write. Each save replaces the previous
/// snapshot so the file always holds the complete transcript.
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conversation: &Conversation) -> PathBuf {
        self.dir.join(format!("{}.json", conversation.id))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), TranscriptError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            TranscriptError::Storage(format!("Failed to create transcript directory: {e}"))
        })?;

        let content = serde_json::to_string_pretty(&conversation.messages).map_err(|e| {
            TranscriptError::Storage(format!("Failed to serialize transcript: {e}"))
        })?;

        let path = self.path_for(conversation);
        std::fs::write(&path, content)
            .map_err(|e| TranscriptError::Storage(format!("Failed to write transcript: {e}")))?;

        debug!(path = %path.display(), messages = conversation.messages.len(), "Transcript saved");
        Ok(())
    }
}

/// A store that discards everything. Used in tests and when persistence is
/// disabled.
pub struct NoopTranscriptStore;

#[async_trait]
impl TranscriptStore for NoopTranscriptStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn save(&self, _conversation: &Conversation) -> Result<(), TranscriptError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrochat_core::message::Message;

    #[tokio::test]
    async fn save_writes_full_message_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(dir.path());

        let mut conv = Conversation::new();
        conv.push(Message::system("sys"));
        conv.push(Message::user("hello"));
        store.save(&conv).await.unwrap();

        let path = dir.path().join(format!("{}.json", conv.id));
        let content = std::fs::read_to_string(&path).unwrap();
        let messages: Vec<Message> = serde_json::from_str(&content).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(dir.path());

        let mut conv = Conversation::new();
        conv.push(Message::user("one"));
        store.save(&conv).await.unwrap();

        conv.push(Message::assistant("two"));
        store.save(&conv).await.unwrap();

        let path = dir.path().join(format!("{}.json", conv.id));
        let messages: Vec<Message> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileTranscriptStore::new(&nested);

        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        store.save(&conv).await.unwrap();
        assert!(nested.join(format!("{}.json", conv.id)).exists());
    }

    #[tokio::test]
    async fn noop_store_accepts_everything() {
        let store = NoopTranscriptStore;
        let conv = Conversation::new();
        store.save(&conv).await.unwrap();
        assert_eq!(store.name(), "noop");
    }
}
