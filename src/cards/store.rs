//! Card store — in-memory ordered pack with broadcast to subscribers.
//!
//! Most recently added cards come first. The card list is swapped wholesale
//! on every change, so a snapshot handed to the assembler stays intact.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use super::drop::{DroppedFile, cards_from_drop};
use super::model::{Card, PackEvent};
use crate::sessions::Session;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// In-memory spec pack backed by a broadcast channel for change fan-out.
pub struct CardStore {
    cards: RwLock<Arc<Vec<Card>>>,
    tx: broadcast::Sender<PackEvent>,
}

impl CardStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            cards: RwLock::new(Arc::new(Vec::new())),
            tx,
        })
    }

    /// Subscribe to pack change events.
    pub fn subscribe(&self) -> broadcast::Receiver<PackEvent> {
        self.tx.subscribe()
    }

    /// Prepend a card and broadcast it.
    pub async fn add_card(&self, card: Card) {
        info!(card_id = %card.id, kind = %card.kind, "Card added to pack");

        let msg = PackEvent::CardAdded { card: card.clone() };
        {
            let mut cards = self.cards.write().await;
            let mut next = Vec::with_capacity(cards.len() + 1);
            next.push(card);
            next.extend(cards.iter().cloned());
            *cards = Arc::new(next);
        }

        // Broadcast — ok if nobody is listening
        let _ = self.tx.send(msg);
    }

    /// Prepend a batch, keeping its order: batch item 0 ends up first.
    pub async fn add_cards_batch(&self, batch: Vec<Card>) {
        if batch.is_empty() {
            return;
        }

        info!(count = batch.len(), "Card batch added to pack");

        let msg = PackEvent::CardsAdded {
            cards: batch.clone(),
        };
        {
            let mut cards = self.cards.write().await;
            let mut next = batch;
            next.extend(cards.iter().cloned());
            *cards = Arc::new(next);
        }

        let _ = self.tx.send(msg);
    }

    /// Remove a card by id. Returns false when it was not there.
    pub async fn remove_card(&self, card_id: Uuid) -> bool {
        let mut cards = self.cards.write().await;

        if !cards.iter().any(|c| c.id == card_id) {
            debug!(card_id = %card_id, "Ignoring removal of unknown card");
            return false;
        }

        let next: Vec<Card> = cards.iter().filter(|c| c.id != card_id).cloned().collect();
        *cards = Arc::new(next);

        info!(card_id = %card_id, "Card removed from pack");
        let _ = self.tx.send(PackEvent::CardRemoved { id: card_id });
        true
    }

    /// Turn a drop into cards (files first, then text) and add them as one batch.
    pub async fn ingest_drop(&self, files: &[DroppedFile], plain_text: Option<&str>) -> Vec<Card> {
        let cards = cards_from_drop(files, plain_text);
        self.add_cards_batch(cards.clone()).await;
        cards
    }

    /// Add the session's latest assistant reply as a markdown excerpt card.
    pub async fn capture_reply(&self, session: &Session, redactions: &[String]) -> Option<Card> {
        let Some(last) = session.latest_assistant_message() else {
            debug!(session_id = %session.id, "No assistant reply to capture");
            return None;
        };

        let card = Card::markdown(&last.content)
            .with_title(format!("{} — Excerpt", session.title))
            .with_tags(["spec"])
            .with_redactions(redactions);

        self.add_card(card.clone()).await;
        Some(card)
    }

    /// Current card sequence, most recent first.
    pub async fn cards(&self) -> Arc<Vec<Card>> {
        Arc::clone(&*self.cards.read().await)
    }

    pub async fn get(&self, card_id: Uuid) -> Option<Card> {
        self.cards.read().await.iter().find(|c| c.id == card_id).cloned()
    }

    /// Get the number of cards in the pack.
    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    /// Check if the pack is empty.
    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::model::CardKind;
    use crate::sessions::{Message, Role};

    fn ids(cards: &[Card]) -> Vec<Uuid> {
        cards.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn add_card_prepends() {
        let store = CardStore::new();
        assert!(store.is_empty().await);

        let a = Card::markdown("a");
        let b = Card::markdown("b");
        store.add_card(a.clone()).await;
        store.add_card(b.clone()).await;

        assert_eq!(ids(&store.cards().await), vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn batch_keeps_internal_order_at_front() {
        let store = CardStore::new();
        let old = Card::text("old");
        store.add_card(old.clone()).await;

        let batch = vec![Card::text("1"), Card::text("2"), Card::text("3")];
        let batch_ids = ids(&batch);
        store.add_cards_batch(batch).await;

        let cards = store.cards().await;
        assert_eq!(ids(&cards[..3]), batch_ids);
        assert_eq!(cards[3].id, old.id);
    }

    #[tokio::test]
    async fn add_then_remove_restores_sequence() {
        let store = CardStore::new();
        store.add_card(Card::text("x")).await;
        store.add_card(Card::mermaid("graph TD")).await;
        let before = store.cards().await;

        let card = Card::attachment("y.png");
        let id = card.id;
        store.add_card(card).await;
        assert!(store.remove_card(id).await);

        assert_eq!(*store.cards().await, *before);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let store = CardStore::new();
        store.add_card(Card::text("x")).await;
        assert!(!store.remove_card(Uuid::new_v4()).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn snapshot_survives_later_mutation() {
        let store = CardStore::new();
        let card = Card::text("x");
        store.add_card(card.clone()).await;
        let snapshot = store.cards().await;

        store.remove_card(card.id).await;
        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn ingest_drop_adds_files_then_text_at_front() {
        let store = CardStore::new();
        let existing = Card::text("existing");
        store.add_card(existing.clone()).await;

        let added = store
            .ingest_drop(&[DroppedFile::new("diagram.png")], Some("pasted"))
            .await;
        assert_eq!(added.len(), 2);

        let cards = store.cards().await;
        assert_eq!(
            cards[0].kind,
            CardKind::Attachment {
                path: "diagram.png".into()
            }
        );
        assert_eq!(cards[1].title.as_deref(), Some("Dropped Text"));
        assert_eq!(cards[2].id, existing.id);
    }

    #[tokio::test]
    async fn empty_drop_adds_nothing() {
        let store = CardStore::new();
        let mut rx = store.subscribe();
        assert!(store.ingest_drop(&[], Some("  ")).await.is_empty());
        assert!(store.is_empty().await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn capture_reply_builds_excerpt_card() {
        let store = CardStore::new();
        let mut session = Session::new("claude", "Claude 3.7");
        session.messages.push(Message::new(Role::User, "q"));
        session.messages.push(Message::new(Role::Assistant, "the answer"));

        let redactions = vec!["pii.email".to_string()];
        let card = store.capture_reply(&session, &redactions).await.unwrap();

        assert_eq!(card.title.as_deref(), Some("Claude 3.7 — Excerpt"));
        assert_eq!(card.content(), Some("the answer"));
        assert_eq!(card.tags, vec!["spec"]);
        assert_eq!(card.redactions, redactions);
        assert_eq!(store.cards().await[0].id, card.id);
    }

    #[tokio::test]
    async fn capture_without_reply_is_noop() {
        let store = CardStore::new();
        let session = Session::new("claude", "Claude 3.7");
        assert!(store.capture_reply(&session, &[]).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn broadcast_works() {
        let store = CardStore::new();
        let mut rx = store.subscribe();

        let card = Card::markdown("hi");
        let card_id = card.id;
        store.add_card(card).await;

        match rx.recv().await.unwrap() {
            PackEvent::CardAdded { card } => assert_eq!(card.id, card_id),
            _ => panic!("Expected CardAdded"),
        }

        store.remove_card(card_id).await;
        match rx.recv().await.unwrap() {
            PackEvent::CardRemoved { id } => assert_eq!(id, card_id),
            _ => panic!("Expected CardRemoved"),
        }
    }
}
