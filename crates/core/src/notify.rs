//! Live outbound notifications — what the connected client sees during a turn.
//!
//! Every content increment, tool-call progress increment, and completed tool
//! result is published here as soon as it is produced, so the client can
//! render the response as it streams.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A single notification event, tagged by kind so the client can render
/// text, tool-call progress, and tool results differently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Partial assistant text.
    TextResponse { message: String },

    /// Tool-call progress: a newly opened invocation's name, then its
    /// argument increments.
    ToolCall { message: String },

    /// A completed tool result.
    ToolCallResult { message: String },
}

impl Notification {
    /// The kind discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextResponse { .. } => "text_response",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolCallResult { .. } => "tool_call_result",
        }
    }
}

/// A broadcast-based bus for notifications.
///
/// Components publish without knowing who is listening; each connected
/// client subscribes and filters for what it cares about.
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Create a new bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification to all subscribers.
    pub fn publish(&self, notification: Notification) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(notification);
    }

    /// Subscribe to receive notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let event = Notification::TextResponse {
            message: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"text_response""#));
        assert!(json.contains(r#""message":"Hello""#));
    }

    #[test]
    fn kind_names() {
        assert_eq!(
            Notification::TextResponse { message: "x".into() }.kind(),
            "text_response"
        );
        assert_eq!(
            Notification::ToolCall { message: "x".into() }.kind(),
            "tool_call"
        );
        assert_eq!(
            Notification::ToolCallResult { message: "x".into() }.kind(),
            "tool_call_result"
        );
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let json = r#"{"type":"tool_call","message":"shell: "}"#;
        let event: Notification = serde_json::from_str(json).unwrap();
        match event {
            Notification::ToolCall { message } => assert_eq!(message, "shell: "),
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn bus_publish_subscribe() {
        let bus = NotificationBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Notification::ToolCallResult {
            message: "4".into(),
        });

        let event = rx.recv().await.unwrap();
        match event {
            Notification::ToolCallResult { message } => assert_eq!(message, "4"),
            _ => panic!("Expected ToolCallResult"),
        }
    }

    #[test]
    fn bus_no_subscribers_doesnt_panic() {
        let bus = NotificationBus::new(16);
        bus.publish(Notification::TextResponse {
            message: "nobody listening".into(),
        });
    }
}
