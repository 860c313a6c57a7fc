//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! execute shell commands, do arithmetic, etc. Each tool declares an input
//! schema used both for advertising to the model and for validating the
//! arguments the model sends back.

use crate::error::ToolError;
use crate::message::ToolInvocation;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

/// The core Tool trait.
///
/// Each tool implements this trait and is registered in the ToolRegistry at
/// process start; the tool set is closed-world, no runtime discovery.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "calc").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    ///
    /// Implementations deserialize `arguments` into their input struct;
    /// a mismatch is `ToolError::InvalidArguments`.
    async fn execute(&self, arguments: serde_json::Value)
    -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The orchestrator uses this to:
/// 1. Get tool definitions to advertise to the model
/// 2. Dispatch invocations when the model requests them
///
/// Read-only after startup; safe for concurrent dispatch.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for advertising to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Dispatch a tool invocation, always producing a result string.
    ///
    /// A malformed or unknown invocation must not crash the conversation:
    /// unknown names, unparsable argument strings, schema mismatches, and
    /// execution failures all come back as descriptive result strings that
    /// are fed to the model like any other tool output.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> String {
        let Some(tool) = self.get(&invocation.name) else {
            let mut available = self.names();
            available.sort_unstable();
            return format!(
                "Error: unknown tool '{}' (available: {})",
                invocation.name,
                available.join(", ")
            );
        };

        let arguments: serde_json::Value = match serde_json::from_str(&invocation.arguments) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %invocation.name, error = %e, "Unparsable tool arguments");
                return format!(
                    "Error: arguments for tool '{}' are not valid JSON: {e}",
                    invocation.name
                );
            }
        };

        match tool.execute(arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %invocation.name, error = %e, "Tool execution failed");
                format!("Error: {e}")
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
