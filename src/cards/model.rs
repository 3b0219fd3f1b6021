//! Card data model — content kinds and pack events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a card. Each kind carries its own shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardKind {
    /// Markdown note, usually a captured agent reply.
    Markdown { content: String },
    /// Plain text note.
    Text { content: String },
    /// Reference to a file by path. No bytes are held.
    Attachment { path: String },
    /// Diagram source text.
    Mermaid { content: String },
}

impl CardKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Markdown { .. } => "markdown",
            Self::Text { .. } => "text",
            Self::Attachment { .. } => "attachment",
            Self::Mermaid { .. } => "mermaid",
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of content destined for a bundle. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique card ID, never reused.
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: CardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Redaction policy ids, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redactions: Vec<String>,
}

impl Card {
    pub fn new(kind: CardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: None,
            tags: Vec::new(),
            redactions: Vec::new(),
        }
    }

    pub fn markdown(content: impl Into<String>) -> Self {
        Self::new(CardKind::Markdown {
            content: content.into(),
        })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(CardKind::Text {
            content: content.into(),
        })
    }

    pub fn attachment(path: impl Into<String>) -> Self {
        Self::new(CardKind::Attachment { path: path.into() })
    }

    pub fn mermaid(content: impl Into<String>) -> Self {
        Self::new(CardKind::Mermaid {
            content: content.into(),
        })
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the redaction policy ids.
    pub fn with_redactions(mut self, redactions: &[String]) -> Self {
        self.redactions = redactions.to_vec();
        self
    }

    /// Text body for markdown, text and mermaid cards.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            CardKind::Markdown { content }
            | CardKind::Text { content }
            | CardKind::Mermaid { content } => Some(content),
            CardKind::Attachment { .. } => None,
        }
    }

    /// Label shown in listings: the title, else the kind name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(self.kind.name())
    }

    pub fn is_mermaid(&self) -> bool {
        matches!(self.kind, CardKind::Mermaid { .. })
    }
}

/// Change notifications fanned out to pack subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PackEvent {
    /// A single card was prepended.
    CardAdded { card: Card },
    /// A batch was prepended, in order.
    CardsAdded { cards: Vec<Card> },
    /// A card was removed.
    CardRemoved { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_ids_are_unique() {
        let a = Card::markdown("a");
        let b = Card::markdown("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn kind_is_flattened_into_card_json() {
        let card = Card::attachment("x.png").with_title("Screenshot");
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["kind"], "attachment");
        assert_eq!(json["path"], "x.png");
        assert_eq!(json["title"], "Screenshot");
        assert!(json.get("content").is_none());
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn card_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "kind": "mermaid",
            "content": "graph TD\nA-->B"
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert!(card.is_mermaid());
        assert_eq!(card.content(), Some("graph TD\nA-->B"));
        assert!(card.title.is_none());
        assert!(card.redactions.is_empty());
    }

    #[test]
    fn label_falls_back_to_kind() {
        assert_eq!(Card::text("t").label(), "text");
        assert_eq!(Card::text("t").with_title("Notes").label(), "Notes");
        assert_eq!(CardKind::Mermaid { content: String::new() }.to_string(), "mermaid");
    }

    #[test]
    fn attachment_has_no_content() {
        assert!(Card::attachment("a.pdf").content().is_none());
    }

    #[test]
    fn pack_event_serde() {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(&PackEvent::CardRemoved { id }).unwrap();
        assert!(json.contains("\"type\":\"card_removed\""));
        match serde_json::from_str::<PackEvent>(&json).unwrap() {
            PackEvent::CardRemoved { id: parsed } => assert_eq!(parsed, id),
            _ => panic!("Expected CardRemoved"),
        }
    }
}
