//! Conversation orchestration for Ferrochat.
//!
//! One turn = user message → model call (tools permitted) → optional tool
//! fan-out → second model call (tools denied) → final assistant reply.

pub mod engine;

pub use engine::ChatEngine;
