//! LLM provider implementation for Ferrochat.
//!
//! Two pieces:
//! - [`reconstruct`] — the pure state machine that folds an ordered sequence
//!   of stream fragments into one complete message.
//! - [`openai`] — the stream consumer that drives an OpenAI-compatible
//!   `/chat/completions` SSE call and feeds the reconstructor.

pub mod openai;
pub mod reconstruct;

pub use openai::OpenAiProvider;
pub use reconstruct::{Fragment, FinishReason, Reconstructor, ToolCallPiece};
