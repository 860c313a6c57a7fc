//! Shell tool — execute a list of system commands.
//!
//! Supports command allowlisting. Each command runs through the platform
//! shell; the result is a JSON array with one entry per command.

use async_trait::async_trait;
use ferrochat_core::error::ToolError;
use ferrochat_core::tool::Tool;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

/// One shell command with optional arguments.
#[derive(Debug, Deserialize)]
struct ShellCommand {
    command: String,
    #[serde(default)]
    arguments: Option<Vec<String>>,
}

impl ShellCommand {
    fn command_line(&self) -> String {
        match &self.arguments {
            Some(arguments) if !arguments.is_empty() => {
                format!("{} {}", self.command, arguments.join(" "))
            }
            _ => self.command.clone(),
        }
    }
}

/// The shell tool's input: a list of commands to run in order.
#[derive(Debug, Deserialize)]
struct ShellToolInput {
    commands: Vec<ShellCommand>,
}

/// Execute shell commands with safety constraints.
pub struct ShellTool {
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self { allowed_commands }
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true; // No allowlist = all commands allowed
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("").trim();
        self.allowed_commands.iter().any(|a| a == base_cmd)
    }

    async fn run_one(&self, command_line: &str) -> String {
        if !self.is_command_allowed(command_line) {
            let base = command_line.split_whitespace().next().unwrap_or("");
            warn!(command = %command_line, "Command not in allowlist");
            return format!("Error: command '{base}' is not in the allowlist");
        }

        debug!(command = %command_line, "Executing shell command");

        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", command_line]).output().await
        } else {
            Command::new("sh").args(["-c", command_line]).output().await
        };

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if output.status.success() {
                    stdout
                } else {
                    let code = output.status.code().unwrap_or(-1);
                    warn!(command = %command_line, exit_code = code, "Command failed");
                    format!("[exit code: {code}]\n{stdout}\n{stderr}")
                }
            }
            Err(e) => format!("Error: failed to spawn '{command_line}': {e}"),
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a list of shell commands and return their outputs as a JSON array. Failed commands report their exit code and stderr."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "commands": {
                    "type": "array",
                    "description": "List of shell commands to execute",
                    "items": {
                        "type": "object",
                        "properties": {
                            "command": {
                                "type": "string",
                                "description": "Command to execute"
                            },
                            "arguments": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Optional arguments to pass to the command. Enclose arguments containing spaces in escaped double quotes."
                            }
                        },
                        "required": ["command"]
                    }
                }
            },
            "required": ["commands"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let input: ShellToolInput = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let mut results = Vec::with_capacity(input.commands.len());
        for shell_command in &input.commands {
            results.push(self.run_one(&shell_command.command_line()).await);
        }

        serde_json::to_string(&results).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "shell".into(),
            reason: e.to_string(),
        })
    }
}
