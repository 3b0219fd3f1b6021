//! Error types for specpack.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the dispatch envelope client.
///
/// Non-2xx statuses are not an error here: the body is decoded and handed
/// back verbatim, the same as a 2xx.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Response from {target}/{op} is not JSON: {reason}")]
    Decode {
        target: String,
        op: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Diagram lint/render failures. The message is shown as-is next to the preview.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("{0}")]
    Syntax(String),

    #[error("Renderer unavailable: {0}")]
    Unavailable(String),
}

impl RenderError {
    /// Text shown in place of the diagram.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
