//! Bundle wire model, shaped like the backend's `SpecBundle`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a bundle part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Markdown,
    Attachment,
    Mermaid,
}

/// One content block of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlePart {
    pub kind: PartKind,
    /// Set for attachments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Set for markdown and mermaid parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl BundlePart {
    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Markdown,
            path: None,
            content: Some(content.into()),
        }
    }

    pub fn mermaid(content: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Mermaid,
            path: None,
            content: Some(content.into()),
        }
    }

    pub fn attachment(path: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Attachment,
            path: Some(path.into()),
            content: None,
        }
    }
}

/// A session that existed when the bundle was assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSession {
    /// Agent label, or the raw agent id when the agent is unknown.
    pub agent: String,
    pub session_id: Uuid,
}

/// Immutable publish snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub title: String,
    pub created_by: String,
    pub source_sessions: Vec<SourceSession>,
    pub parts: Vec<BundlePart>,
    pub tags: Vec<String>,
    pub redactions: Vec<String>,
}
