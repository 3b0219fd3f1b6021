//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConfigError;

/// Provider identifiers whose credentials can be stored on the backend.
pub const PROVIDERS: [&str; 4] = ["openai", "anthropic", "xai", "google"];

/// Agents selected for fan-out on startup.
pub const DEFAULT_SELECTED_AGENTS: [&str; 2] = ["gpt5", "grok"];

/// Context path offered before the operator types one.
pub const DEFAULT_CONTEXT_PATH: &str = "specs/opencode-pm-gates.md";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the project-management backend (no trailing slash needed).
    pub pm_base_url: String,
    /// Author recorded on every published bundle.
    pub created_by: String,
    /// Redaction policy ids copied onto captured cards and bundles.
    pub default_redactions: Vec<String>,
    /// Directory for the rolling log file.
    pub logs_dir: PathBuf,
    pub specs_dir: PathBuf,
    pub attachments_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pm_base_url: "http://localhost:8080".to_string(),
            created_by: "@fglogan".to_string(),
            default_redactions: vec!["pii.email".to_string(), "secrets.env".to_string()],
            logs_dir: PathBuf::from("docs/logs"),
            specs_dir: PathBuf::from("specs"),
            attachments_dir: PathBuf::from("attachments"),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `SPECPACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SPECPACK_PM_BASE_URL") {
            if !url.trim().is_empty() {
                config.pm_base_url = url.trim().to_string();
            }
        }
        if let Ok(created_by) = std::env::var("SPECPACK_CREATED_BY") {
            if !created_by.trim().is_empty() {
                config.created_by = created_by.trim().to_string();
            }
        }
        if let Ok(redactions) = std::env::var("SPECPACK_REDACTIONS") {
            config.default_redactions = parse_redactions(&redactions);
        }
        if let Ok(dir) = std::env::var("SPECPACK_LOGS_DIR") {
            config.logs_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pm_base_url.starts_with("http://") || self.pm_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "SPECPACK_PM_BASE_URL".to_string(),
                message: format!("expected an http(s) URL, got {:?}", self.pm_base_url),
            });
        }
        Ok(())
    }

    /// Create the log, spec and attachment directories.
    pub async fn ensure_dirs(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.logs_dir).await?;
        fs::create_dir_all(&self.specs_dir).await?;
        fs::create_dir_all(&self.attachments_dir).await?;
        Ok(())
    }
}

/// Split a comma separated redaction list, dropping blanks.
pub fn parse_redactions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A statically configured agent that sessions are opened against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    /// Display label; also the session title.
    pub label: String,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl AgentDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            provider: provider.into(),
            model: model.into(),
            persona: None,
        }
    }

    /// Set the persona.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }
}

/// The built-in agent roster.
pub fn default_agents() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new("gpt5", "GPT-5 Thinking", "openai", "gpt-5-thinking"),
        AgentDescriptor::new("gemini", "Gemini 2.5 Pro", "google", "gemini-2.5-pro"),
        AgentDescriptor::new("claude", "Claude 3.7", "anthropic", "claude-3.7"),
        AgentDescriptor::new("grok", "Grok Fast Coder 1", "xai", "grok-fast-coder-1")
            .with_persona("build-agent"),
    ]
}

/// Lookup table over the agent roster.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        Self { agents }
    }

    pub fn get(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Label for an agent id, falling back to the id itself.
    pub fn label_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|a| a.label.as_str()).unwrap_or(id)
    }

    pub fn first(&self) -> Option<&AgentDescriptor> {
        self.agents.first()
    }

    pub fn all(&self) -> &[AgentDescriptor] {
        &self.agents
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(default_agents())
    }
}
