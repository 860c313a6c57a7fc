//! Provider trait — the abstraction over the LLM backend.
//!
//! A Provider knows how to send a transcript to a model and reconstruct the
//! streamed response into one complete message, emitting live notifications
//! along the way. The orchestrator calls it without knowing which backend is
//! behind it, which is also what makes the turn protocol testable.

use crate::error::ProviderError;
use crate::interrupt::InterruptSignal;
use crate::message::Message;
use crate::notify::NotificationBus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool definition advertised to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The core Provider trait.
///
/// One call = one streaming request carrying the full transcript. When
/// `tools` is `Some`, tool use is permitted this call and the definitions are
/// advertised; `None` forbids tool use (the second call of a turn).
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Stream one model response and reconstruct it into a message.
    ///
    /// Never returns an empty assistant message: an interrupted stream
    /// becomes a notice message, and an empty reconstruction is substituted
    /// with a fixed error text. Transport and desync failures are the only
    /// hard errors.
    async fn get_message(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        signal: &InterruptSignal,
        bus: &NotificationBus,
    ) -> std::result::Result<Message, ProviderError>;
}
