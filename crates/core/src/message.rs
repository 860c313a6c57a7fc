//! Message and Conversation domain types.
//!
//! These are the core value objects that flow through the entire system:
//! the user sends a message → the orchestrator appends it to the transcript →
//! the provider streams back an assistant message → tool results are appended
//! as `tool` messages.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
///
/// Timestamp-derived so transcript files sort chronologically on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Utc::now().format("%Y_%m_%d_%H_%M_%S").to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
///
/// Only populated fields are serialized, so the same shape is used for the
/// wire payload and the persisted transcript. An assistant message carries
/// either text content or a non-empty tool-invocation list, never both;
/// neither is the empty-response error condition handled by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    #[serde(default = "new_message_id")]
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// If this is a tool result, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create an assistant message carrying tool invocations.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    /// True if this message carries neither text content nor tool calls.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().unwrap_or("").is_empty() && self.tool_calls.is_empty()
    }
}

/// A tool invocation embedded in an assistant message.
///
/// During stream reconstruction `arguments` is an accumulator; once the
/// owning message is finalized it is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique ID assigned by the model (stable within one assistant turn)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A conversation: an ordered, append-only sequence of messages.
///
/// Exclusively owned by the orchestrator, the single writer. The full
/// transcript is resent on every model call; no server-side memory is
/// assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// Whether to append project state to the system prompt
    #[serde(default)]
    pub include_project_state: bool,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            include_project_state: false,
        }
    }

    /// Append a message. The transcript never shrinks or reorders.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The last message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
