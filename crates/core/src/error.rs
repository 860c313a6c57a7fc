//! Error types for the Ferrochat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Ferrochat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Transcript errors ---
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Non-success status from the remote endpoint. Fatal to the current
    /// call; the transcript up to this point remains valid.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// The connection failed or dropped mid-stream.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote stream violated the delta protocol (e.g. a continuation
    /// fragment with no open invocation). Never repaired speculatively.
    #[error("Stream desynchronized: {0}")]
    Desynchronized(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Storage error: {0}")]
    Storage(String),
}
