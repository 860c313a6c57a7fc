//! Delta reconstruction — folding stream fragments into one message.
//!
//! The remote protocol sends an assistant turn as an ordered sequence of
//! partial deltas: a role-marker opener, then either text increments or
//! tool-call pieces, then a terminal finish reason. A tool invocation's
//! identity and name arrive in one id-bearing piece; all of its argument
//! text follows as headerless continuations, strictly in order and before
//! the next id-bearing piece. Reconstruction relies on that ordering and
//! fails hard when the stream violates it; a desynchronized stream must
//! not be silently repaired.

use ferrochat_core::error::ProviderError;
use ferrochat_core::message::{Message, ToolInvocation};

/// Why the model stopped emitting fragments for this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// End of a text response sequence.
    Stop,
    /// End of a tool call sequence.
    ToolCalls,
    /// Any other reason the endpoint may report; treated as terminal.
    Other,
}

impl FinishReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "tool_calls" => Self::ToolCalls,
            _ => Self::Other,
        }
    }
}

/// One partial tool-invocation piece inside a fragment.
///
/// An id-bearing piece opens a new invocation (carrying the function name);
/// a piece without an id continues the most recently opened invocation with
/// an argument increment.
#[derive(Debug, Clone, Default)]
pub struct ToolCallPiece {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallPiece {
    /// True if this piece opens a new invocation.
    pub fn is_opener(&self) -> bool {
        self.id.is_some()
    }
}

/// One decoded unit read off the stream. Transient: consumed exactly once
/// by the reconstructor and then discarded.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub role: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallPiece>,
    pub finish_reason: Option<FinishReason>,
}

/// What the caller should do after applying a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep feeding fragments.
    Continue,
    /// A terminal reason was seen; stop feeding fragments and finalize.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InText,
    InToolCall,
    Finished,
}

/// Folds an ordered fragment sequence into exactly one assistant message.
///
/// Pure state machine: `Idle → InText | InToolCall → Finished`. A message
/// is either text or tool calls; the protocol never interleaves them, and
/// an interleaving fragment is a desynchronization error.
#[derive(Debug)]
pub struct Reconstructor {
    state: State,
    content: String,
    invocations: Vec<ToolInvocation>,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            content: String::new(),
            invocations: Vec::new(),
        }
    }

    /// Apply one fragment. Rules are checked in order; first match wins.
    pub fn apply(&mut self, fragment: &Fragment) -> Result<Step, ProviderError> {
        if self.state == State::Finished {
            return Ok(Step::Finished);
        }

        let text = fragment.content.as_deref().unwrap_or("");

        // Rule 1: the turn-opening role marker carries no payload.
        if fragment.role.is_some() && text.is_empty() && fragment.tool_calls.is_empty() {
            return Ok(Step::Continue);
        }

        // Rule 2: a text increment.
        if !text.is_empty() {
            if self.state == State::InToolCall {
                return Err(ProviderError::Desynchronized(
                    "text increment arrived inside a tool-call sequence".into(),
                ));
            }
            self.state = State::InText;
            self.content.push_str(text);
            return Ok(Step::Continue);
        }

        // Rule 3: tool-invocation pieces.
        if !fragment.tool_calls.is_empty() {
            if self.state == State::InText {
                return Err(ProviderError::Desynchronized(
                    "tool-call piece arrived inside a text sequence".into(),
                ));
            }
            self.state = State::InToolCall;
            for piece in &fragment.tool_calls {
                self.apply_piece(piece)?;
            }
            return Ok(Step::Continue);
        }

        // Rule 4: a terminal reason finalizes with whatever has accumulated.
        if fragment.finish_reason.is_some() {
            self.state = State::Finished;
            return Ok(Step::Finished);
        }

        // An empty delta folds to nothing.
        Ok(Step::Continue)
    }

    fn apply_piece(&mut self, piece: &ToolCallPiece) -> Result<(), ProviderError> {
        if let Some(id) = &piece.id {
            // An id-bearing piece opens a new invocation; it becomes "current".
            self.invocations.push(ToolInvocation {
                id: id.clone(),
                name: piece.name.clone().unwrap_or_default(),
                arguments: piece.arguments.clone().unwrap_or_default(),
            });
            return Ok(());
        }

        // A headerless piece continues the most recently opened invocation.
        let Some(current) = self.invocations.last_mut() else {
            return Err(ProviderError::Desynchronized(
                "continuation piece arrived with no open invocation".into(),
            ));
        };
        if let Some(arguments) = &piece.arguments {
            current.arguments.push_str(arguments);
        }
        Ok(())
    }

    /// A human-readable rendering of whatever has accumulated so far, used
    /// for the interruption notice.
    pub fn partial_summary(&self) -> String {
        if !self.content.is_empty() {
            return self.content.clone();
        }
        self.invocations
            .iter()
            .map(|call| format!("{}({})", call.name, call.arguments))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Finalize into a message: text content if any accumulated, otherwise
    /// the tool-invocation list. Invocations are frozen from here on.
    ///
    /// The result may be empty only on the interrupted/error path; the
    /// caller substitutes a notice for an empty message.
    pub fn finish(self) -> Message {
        if !self.content.is_empty() {
            Message::assistant(self.content)
        } else {
            Message::assistant_tool_calls(self.invocations)
        }
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}
