//! Per-card previews and the live diagram helper.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use uuid::Uuid;

use super::preview::{DiagramPreview, PreviewSnapshot};
use super::render::Renderer;
use crate::cards::{Card, CardStore};

/// Starting source for the live helper.
pub const DEFAULT_DIAGRAM: &str = "flowchart TD\nA[Start] --> B{Gate?}\nB -- Yes --> C[Validate]\nB -- No --> D[Iterate]\nC --> E[Publish]";

/// Rendered in place of an empty card source.
const PLACEHOLDER_DIAGRAM: &str = "graph TD\nA-->B";

/// Title of cards added from the helper.
const HELPER_CARD_TITLE: &str = "Diagram";

/// One preview per mermaid card, keyed by card id.
///
/// Cards are immutable, so a preview is edited once when its card first
/// appears and torn down when the card leaves the pack.
pub struct PreviewRegistry {
    renderer: Arc<dyn Renderer>,
    previews: Mutex<HashMap<Uuid, DiagramPreview>>,
}

impl PreviewRegistry {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            previews: Mutex::new(HashMap::new()),
        }
    }

    /// Match the registry to a card snapshot.
    pub fn sync(&self, cards: &[Card]) {
        let mut previews = self.previews.lock().unwrap_or_else(|p| p.into_inner());

        let live: Vec<&Card> = cards.iter().filter(|c| c.is_mermaid()).collect();
        previews.retain(|id, preview| {
            let keep = live.iter().any(|c| c.id == *id);
            if !keep {
                debug!(card_id = %id, "Tearing down diagram preview");
                preview.teardown();
            }
            keep
        });

        for card in live {
            if previews.contains_key(&card.id) {
                continue;
            }
            let source = match card.content() {
                Some(s) if !s.trim().is_empty() => s,
                _ => PLACEHOLDER_DIAGRAM,
            };
            let preview = DiagramPreview::new(Arc::clone(&self.renderer));
            preview.edit(source);
            previews.insert(card.id, preview);
        }
    }

    pub fn snapshot(&self, card_id: Uuid) -> Option<PreviewSnapshot> {
        let previews = self.previews.lock().unwrap_or_else(|p| p.into_inner());
        previews.get(&card_id).map(DiagramPreview::snapshot)
    }

    pub fn len(&self) -> usize {
        self.previews.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single editable diagram outside the pack.
pub struct DiagramHelper {
    source: Mutex<String>,
    preview: DiagramPreview,
}

impl DiagramHelper {
    /// Seeded with [`DEFAULT_DIAGRAM`]. Call [`refresh`](Self::refresh) to
    /// render the seed.
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            source: Mutex::new(DEFAULT_DIAGRAM.to_string()),
            preview: DiagramPreview::new(renderer),
        }
    }

    pub fn source(&self) -> String {
        self.source.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn edit(&self, source: impl Into<String>) {
        let source = source.into();
        *self.source.lock().unwrap_or_else(|p| p.into_inner()) = source.clone();
        self.preview.edit(source);
    }

    /// Re-run the preview on the current source.
    pub fn refresh(&self) {
        self.preview.edit(self.source());
    }

    pub fn preview(&self) -> &DiagramPreview {
        &self.preview
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        self.preview.snapshot()
    }

    /// Add the current source to the pack as a mermaid card.
    pub async fn add_to_pack(&self, store: &CardStore) -> Card {
        let card = Card::mermaid(self.source()).with_title(HELPER_CARD_TITLE);
        info!(card_id = %card.id, "Diagram added from helper");
        store.add_card(card.clone()).await;
        card
    }
}
