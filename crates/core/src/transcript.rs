//! Transcript persistence trait.
//!
//! On every message append the orchestrator hands the full conversation to a
//! store. Implementations live outside core (file-backed, no-op).

use crate::error::TranscriptError;
use crate::message::Conversation;
use async_trait::async_trait;

/// Durable storage for conversation transcripts, keyed by session id.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// A human-readable name for this store (e.g., "file", "noop").
    fn name(&self) -> &str;

    /// Persist the full ordered message list for this conversation.
    ///
    /// Called after every append; each call replaces the previous snapshot.
    async fn save(&self, conversation: &Conversation)
    -> std::result::Result<(), TranscriptError>;
}
