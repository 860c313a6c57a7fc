//! OpenAI-compatible streaming provider.
//!
//! Drives one streaming `/chat/completions` call per model invocation and
//! feeds the decoded fragments to the [`Reconstructor`](crate::reconstruct).
//! The SSE response is line-oriented: each event line carries a `data: `
//! prefix and either a JSON fragment object or the `[DONE]` sentinel.
//! Non-conforming lines are tolerated and skipped.

use crate::reconstruct::{FinishReason, Fragment, Reconstructor, Step, ToolCallPiece};
use async_trait::async_trait;
use ferrochat_core::error::ProviderError;
use ferrochat_core::interrupt::InterruptSignal;
use ferrochat_core::message::{Message, Role};
use ferrochat_core::notify::{Notification, NotificationBus};
use ferrochat_core::provider::{Provider, ToolDefinition};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Substituted when reconstruction finishes with neither content nor tool
/// calls, so the transcript never contains a genuinely empty assistant turn.
const EMPTY_RESPONSE_NOTICE: &str =
    "I'm sorry, there was an error processing the response -- both `content` and `tool_calls` are empty.";

/// An OpenAI-compatible streaming LLM provider.
///
/// Works with any endpoint exposing the `/chat/completions` SSE protocol.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new provider against an arbitrary OpenAI-compatible endpoint.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "openai".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Create a provider against the OpenAI API (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("https://api.openai.com/v1", api_key, model)
    }

    /// Convert our Message types to the wire format, carrying only populated
    /// fields.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: m.content.clone(),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
                name: m.name.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to the wire format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Handle one stream line: strip the `data: ` marker, recognize the
    /// terminal sentinel, decode the fragment, publish its increments, and
    /// fold it into the reconstructor.
    fn process_line(
        line: &str,
        reconstructor: &mut Reconstructor,
        bus: &NotificationBus,
    ) -> Result<LineStep, ProviderError> {
        // Skip empty lines and SSE comments
        if line.is_empty() || line.starts_with(':') {
            return Ok(LineStep::Continue);
        }

        let Some(data) = line.strip_prefix("data: ") else {
            trace!(line = %line, "Skipping non-event stream line");
            return Ok(LineStep::Continue);
        };
        let data = data.trim();

        // "[DONE]" signals end of stream; it is not valid JSON.
        if data == "[DONE]" {
            return Ok(LineStep::Done);
        }

        let fragment = match serde_json::from_str::<StreamResponse>(data) {
            Ok(response) => response.into_fragment(),
            Err(e) => {
                warn!(data = %data, error = %e, "Skipping malformed stream line");
                return Ok(LineStep::Continue);
            }
        };
        let Some(fragment) = fragment else {
            return Ok(LineStep::Continue);
        };

        Self::publish_increments(&fragment, bus);

        match reconstructor.apply(&fragment)? {
            Step::Finished => Ok(LineStep::Done),
            Step::Continue => Ok(LineStep::Continue),
        }
    }

    /// Emit live notifications for whatever this fragment carries, as soon
    /// as it is decoded.
    fn publish_increments(fragment: &Fragment, bus: &NotificationBus) {
        if let Some(content) = fragment.content.as_deref()
            && !content.is_empty()
        {
            bus.publish(Notification::TextResponse {
                message: content.to_string(),
            });
        }

        for piece in &fragment.tool_calls {
            if let Some(name) = piece.name.as_deref()
                && !name.is_empty()
            {
                bus.publish(Notification::ToolCall {
                    message: format!("{name}: "),
                });
            }
            if let Some(arguments) = piece.arguments.as_deref()
                && !arguments.is_empty()
            {
                bus.publish(Notification::ToolCall {
                    message: arguments.to_string(),
                });
            }
        }
    }

    /// Issue the streaming request and consume its line stream.
    async fn consume_stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        signal: &InterruptSignal,
        bus: &NotificationBus,
    ) -> Result<StreamOutcome, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
            "stream": true,
        });

        if let Some(tools) = tools
            && !tools.is_empty()
        {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(
            provider = %self.name,
            model = %self.model,
            messages = messages.len(),
            tools = tools.map(|t| t.len()).unwrap_or(0),
            "Sending streaming request"
        );

        // Interruption is scoped to this call: whatever was raised before
        // now belonged to a previous run.
        signal.clear();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Provider returned error status");
            return Err(ProviderError::Api { status, body });
        }

        let mut reconstructor = Reconstructor::new();
        let mut byte_stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes = chunk_result.map_err(|e| ProviderError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim_end_matches('\r').to_string();
                buffer = buffer[line_end + 1..].to_string();

                // The signal is honored at line boundaries: once observed,
                // no further lines are processed by this run.
                if signal.is_raised() {
                    return Ok(StreamOutcome::Interrupted {
                        partial: reconstructor.partial_summary(),
                    });
                }

                match Self::process_line(&line, &mut reconstructor, bus)? {
                    LineStep::Done => return Ok(StreamOutcome::Completed(reconstructor)),
                    LineStep::Continue => {}
                }
            }
        }

        // Stream ended without a sentinel or terminal reason; finalize with
        // whatever accumulated.
        Ok(StreamOutcome::Completed(reconstructor))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_message(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        signal: &InterruptSignal,
        bus: &NotificationBus,
    ) -> Result<Message, ProviderError> {
        let message = match self.consume_stream(messages, tools, signal, bus).await? {
            StreamOutcome::Completed(reconstructor) => reconstructor.finish(),
            StreamOutcome::Interrupted { partial } => {
                warn!(partial = %partial, "Streaming interrupted by caller");
                Message::assistant(format!(
                    "Streaming interrupted: received a stop request from the user. Partial content: {partial}"
                ))
            }
        };

        if message.is_empty() {
            warn!("Reconstruction produced an empty assistant message");
            return Ok(Message::assistant(EMPTY_RESPONSE_NOTICE));
        }

        Ok(message)
    }
}

/// What to do after one stream line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStep {
    Continue,
    Done,
}

/// How one streaming run ended (transport failures are errors instead).
enum StreamOutcome {
    /// The stream ran to its end; the reconstructor holds the full message.
    Completed(Reconstructor),
    /// The interrupt signal fired mid-stream; carries the accumulation so far.
    Interrupted { partial: String },
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

impl StreamResponse {
    /// Decode into a fragment. Only the first choice matters; a chunk
    /// without choices carries nothing to fold.
    fn into_fragment(self) -> Option<Fragment> {
        let choice = self.choices.into_iter().next()?;
        Some(Fragment {
            role: choice.delta.role,
            content: choice.delta.content,
            tool_calls: choice
                .delta
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCallPiece {
                    id: tc.id,
                    name: tc.function.as_ref().and_then(|f| f.name.clone()),
                    arguments: tc.function.and_then(|f| f.arguments),
                })
                .collect(),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool call delta — arrives incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
