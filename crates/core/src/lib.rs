//! # Ferrochat Core
//!
//! Domain types, traits, and error definitions for the Ferrochat
//! conversational agent backend. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod interrupt;
pub mod message;
pub mod notify;
pub mod provider;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use interrupt::InterruptSignal;
pub use message::{Conversation, Message, Role, SessionId, ToolInvocation};
pub use notify::{Notification, NotificationBus};
pub use provider::{Provider, ToolDefinition};
pub use tool::{Tool, ToolRegistry};
pub use transcript::TranscriptStore;
