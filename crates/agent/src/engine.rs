//! The per-turn orchestration cycle.

use ferrochat_core::error::Error;
use ferrochat_core::interrupt::InterruptSignal;
use ferrochat_core::message::{Conversation, Message};
use ferrochat_core::notify::{Notification, NotificationBus};
use ferrochat_core::provider::{Provider, ToolDefinition};
use ferrochat_core::tool::ToolRegistry;
use ferrochat_core::transcript::TranscriptStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The orchestrator that drives one conversation through its turns.
///
/// The engine is the transcript's single writer: every append goes through
/// one code path that also persists the conversation. Turn protocol:
/// model call 1 with tool use permitted; if the assistant requested tools,
/// dispatch them all concurrently, append one `tool` message per invocation
/// in declaration order, then model call 2 with tool use denied.
pub struct ChatEngine {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tool registry (read-only after startup)
    tools: Arc<ToolRegistry>,

    /// Live notifications to the connected caller
    bus: Arc<NotificationBus>,

    /// Cancellation for the in-flight streaming call
    signal: Arc<InterruptSignal>,

    /// Durable transcript storage
    store: Arc<dyn TranscriptStore>,
}

impl ChatEngine {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        bus: Arc<NotificationBus>,
        signal: Arc<InterruptSignal>,
        store: Arc<dyn TranscriptStore>,
    ) -> Self {
        Self {
            provider,
            tools,
            bus,
            signal,
            store,
        }
    }

    /// The interrupt signal for the currently running call, shared with
    /// whatever surface accepts cancel requests.
    pub fn interrupt_signal(&self) -> Arc<InterruptSignal> {
        Arc::clone(&self.signal)
    }

    /// Start a new conversation with the given system prompt.
    pub async fn start_conversation(
        &self,
        system_prompt: &str,
        include_project_state: bool,
    ) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.include_project_state = include_project_state;
        self.append(&mut conversation, Message::system(system_prompt))
            .await;
        conversation
    }

    /// Process one user turn and return the final assistant message.
    ///
    /// On a hard failure (transport error, stream desync) the transcript
    /// still receives a textual notice before the error propagates, so the
    /// conversation stays consistent and can continue on a future turn.
    pub async fn process_turn(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<Message, Error> {
        info!(
            session = %conversation.id,
            messages = conversation.messages.len(),
            "Processing user turn"
        );

        self.append(conversation, Message::user(text)).await;

        // Model call 1: tool use permitted.
        let definitions = self.tools.definitions();
        let message = self.model_call(conversation, Some(&definitions)).await?;

        if message.tool_calls.is_empty() {
            return Ok(message);
        }

        debug!(count = message.tool_calls.len(), "Executing tool calls");

        // Fan out all invocations concurrently. Failures were already
        // converted to result strings by the registry, so one invocation
        // cannot cancel the others.
        let invocations = message.tool_calls;
        let results = futures::future::join_all(
            invocations.iter().map(|call| self.tools.dispatch(call)),
        )
        .await;

        // Tool messages are appended in declaration order, not completion
        // order.
        for (call, result) in invocations.iter().zip(&results) {
            self.bus.publish(Notification::ToolCallResult {
                message: render_result(result),
            });
            self.append(
                conversation,
                Message::tool_result(&call.id, &call.name, result),
            )
            .await;
        }

        // Model call 2: tool use disallowed this time.
        self.model_call(conversation, None).await
    }

    async fn model_call(
        &self,
        conversation: &mut Conversation,
        definitions: Option<&[ToolDefinition]>,
    ) -> Result<Message, Error> {
        match self
            .provider
            .get_message(&conversation.messages, definitions, &self.signal, &self.bus)
            .await
        {
            Ok(message) => {
                self.append(conversation, message.clone()).await;
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "Model call failed");
                self.append(
                    conversation,
                    Message::assistant(format!("The model call failed: {e}")),
                )
                .await;
                Err(e.into())
            }
        }
    }

    /// The single append path: push to the transcript, then persist.
    /// A persistence failure is logged and does not fail the turn; the
    /// in-memory transcript remains the source of truth.
    async fn append(&self, conversation: &mut Conversation, message: Message) {
        conversation.push(message);
        if let Err(e) = self.store.save(conversation).await {
            warn!(error = %e, "Failed to persist transcript");
        }
    }
}

/// Pretty-print a tool result for display when it parses as JSON.
fn render_result(result: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(result) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| result.to_string()),
        Err(_) => result.to_string(),
    }
}
