//! Server configuration: TOML file with environment variable overrides.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant with access to tools. Use them when they help answer the user's request.";

/// The server configuration.
///
/// Loaded from a TOML file when one is given; every field has a default so
/// a bare `ferrochat` invocation works with just `OPENAI_API_KEY` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// API key for the completion endpoint (env: OPENAI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// File holding the system prompt
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,

    /// File holding the project state appended to the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_state_path: Option<PathBuf>,

    /// Whether to append project state to the system prompt
    #[serde(default)]
    pub include_project_state: bool,

    /// Directory for persisted transcripts
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8600
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("system.txt")
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("conversations")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            system_prompt_path: default_system_prompt_path(),
            project_state_path: None,
            include_project_state: false,
            transcript_dir: default_transcript_dir(),
        }
    }
}

impl ServerConfig {
    /// Load configuration, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            config.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("FERROCHAT_MODEL")
            && !model.is_empty()
        {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("FERROCHAT_BASE_URL")
            && !base_url.is_empty()
        {
            config.base_url = base_url;
        }

        Ok(config)
    }

    /// Assemble the system prompt: the prompt file, plus project state when
    /// the flag is set.
    pub fn system_prompt(&self) -> String {
        let mut prompt = match std::fs::read_to_string(&self.system_prompt_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %self.system_prompt_path.display(),
                    error = %e,
                    "System prompt file unavailable, using built-in default"
                );
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        };

        if self.include_project_state
            && let Some(path) = &self.project_state_path
        {
            match std::fs::read_to_string(path) {
                Ok(state) => {
                    info!(path = %path.display(), "Including project state in system prompt");
                    prompt.push_str("\nCurrent project source code:\n");
                    prompt.push_str(&state);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Project state file unavailable");
                }
            }
        }

        prompt
    }
}
