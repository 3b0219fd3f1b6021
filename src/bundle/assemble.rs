//! Markdown and per-card assembly.

use chrono::{DateTime, SecondsFormat, Utc};

use super::model::{Bundle, BundlePart, SourceSession};
use crate::cards::{Card, CardKind};
use crate::config::AgentRegistry;
use crate::sessions::Session;

/// Tags stamped on every published bundle.
pub const BUNDLE_TAGS: [&str; 4] = ["tes-2025", "laio", "opencode", "spec"];

/// Render the pack as one markdown document: front matter, then one section
/// per card in pack order. Fallback headings number cards by their position
/// in this pass, so they change whenever the pack changes.
pub fn assemble_markdown(cards: &[Card], generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "---".to_string(),
        "title: Spec Bundle".to_string(),
        format!(
            "generated_at: {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        "---".to_string(),
        String::new(),
    ];

    for (i, card) in cards.iter().enumerate() {
        let n = i + 1;
        let heading = |fallback: &str| {
            let title = card
                .title
                .clone()
                .unwrap_or_else(|| format!("{fallback} {n}"));
            format!("\n## {title}")
        };

        match &card.kind {
            CardKind::Markdown { content } | CardKind::Text { content } => {
                lines.push(heading("Section"));
                lines.push(content.clone());
            }
            CardKind::Mermaid { content } => {
                lines.push(heading("Diagram"));
                lines.push(format!("```mermaid\n{content}\n```"));
            }
            CardKind::Attachment { path } => {
                lines.push(heading("Attachment"));
                lines.push(format!("Included attachment: {path}"));
            }
        }
    }

    lines.join("\n")
}

/// One bundle part per card, in pack order.
pub fn card_parts(cards: &[Card]) -> Vec<BundlePart> {
    cards
        .iter()
        .map(|card| match &card.kind {
            CardKind::Markdown { content } | CardKind::Text { content } => {
                BundlePart::markdown(content)
            }
            CardKind::Mermaid { content } => BundlePart::mermaid(content),
            CardKind::Attachment { path } => BundlePart::attachment(path),
        })
        .collect()
}

/// Builds bundles from snapshots. Holds only configuration.
pub struct BundleAssembler<'a> {
    agents: &'a AgentRegistry,
    created_by: &'a str,
    redactions: &'a [String],
}

impl<'a> BundleAssembler<'a> {
    pub fn new(agents: &'a AgentRegistry, created_by: &'a str, redactions: &'a [String]) -> Self {
        Self {
            agents,
            created_by,
            redactions,
        }
    }

    /// Every existing session, whether or not a card came from it.
    fn source_sessions(&self, sessions: &[Session]) -> Vec<SourceSession> {
        sessions
            .iter()
            .map(|s| SourceSession {
                agent: self.agents.label_or_id(&s.agent_id).to_string(),
                session_id: s.id,
            })
            .collect()
    }

    fn bundle(&self, title: &str, sessions: &[Session], parts: Vec<BundlePart>) -> Bundle {
        Bundle {
            title: title.to_string(),
            created_by: self.created_by.to_string(),
            source_sessions: self.source_sessions(sessions),
            parts,
            tags: BUNDLE_TAGS.iter().map(|t| t.to_string()).collect(),
            redactions: self.redactions.to_vec(),
        }
    }

    /// Primary path: a single markdown part holding the whole document.
    pub fn assemble(
        &self,
        title: &str,
        cards: &[Card],
        sessions: &[Session],
        generated_at: DateTime<Utc>,
    ) -> Bundle {
        let markdown = assemble_markdown(cards, generated_at);
        self.bundle(title, sessions, vec![BundlePart::markdown(markdown)])
    }

    /// Per-card path: one part per card.
    pub fn assemble_per_card(&self, title: &str, cards: &[Card], sessions: &[Session]) -> Bundle {
        self.bundle(title, sessions, card_parts(cards))
    }
}
