//! Drag-and-drop ingestion: dropped files and text become cards.

use super::model::Card;

/// Title given to the card synthesised from dropped text.
pub const DROPPED_TEXT_TITLE: &str = "Dropped Text";

/// A dropped file-like entry. Only its name is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Cards for a drop, files first, then the text card.
///
/// The attachment path is the bare file name; no filesystem lookup happens.
pub fn cards_from_drop(files: &[DroppedFile], plain_text: Option<&str>) -> Vec<Card> {
    let mut cards: Vec<Card> = files
        .iter()
        .map(|f| {
            Card::attachment(&f.name)
                .with_title(&f.name)
                .with_tags(["attachment"])
        })
        .collect();

    if let Some(text) = plain_text.map(str::trim).filter(|t| !t.is_empty()) {
        cards.push(Card::markdown(text).with_title(DROPPED_TEXT_TITLE));
    }

    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::model::CardKind;

    #[test]
    fn files_then_text() {
        let cards = cards_from_drop(
            &[DroppedFile::new("a.png"), DroppedFile::new("b.pdf")],
            Some("  notes  "),
        );
        assert_eq!(cards.len(), 3);
        assert_eq!(
            cards[0].kind,
            CardKind::Attachment {
                path: "a.png".into()
            }
        );
        assert_eq!(cards[0].title.as_deref(), Some("a.png"));
        assert_eq!(cards[0].tags, vec!["attachment"]);
        assert_eq!(cards[1].title.as_deref(), Some("b.pdf"));
        assert_eq!(cards[2].title.as_deref(), Some(DROPPED_TEXT_TITLE));
        assert_eq!(cards[2].content(), Some("notes"));
    }

    #[test]
    fn blank_text_is_ignored() {
        assert!(cards_from_drop(&[], Some("   \n")).is_empty());
        assert!(cards_from_drop(&[], None).is_empty());
    }
}
