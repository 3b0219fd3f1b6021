//! Publish orchestrator — snapshot the pack, assemble, dispatch.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::bundle::{Bundle, BundleAssembler};
use crate::cards::CardStore;
use crate::config::AgentRegistry;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::sessions::SessionManager;

/// Title used when the operator has not named the pack.
pub const DEFAULT_PACK_TITLE: &str = "Untitled Spec Bundle";

/// Publish lifecycle as seen by the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishState {
    Idle,
    Publishing,
    /// Backend response, verbatim.
    Published(Value),
    Failed(Value),
}

impl PublishState {
    /// The response to show in the result panel, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Published(v) | Self::Failed(v) => Some(v),
            Self::Idle | Self::Publishing => None,
        }
    }
}

/// What a single `publish` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// Pack was empty; nothing was sent.
    Skipped,
    Published(Value),
    Failed(Value),
}

pub struct Publisher {
    dispatcher: Arc<dyn Dispatcher>,
    agents: Arc<AgentRegistry>,
    created_by: String,
    redactions: Vec<String>,
    state: RwLock<PublishState>,
}

impl Publisher {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        agents: Arc<AgentRegistry>,
        created_by: impl Into<String>,
        redactions: Vec<String>,
    ) -> Self {
        Self {
            dispatcher,
            agents,
            created_by: created_by.into(),
            redactions,
            state: RwLock::new(PublishState::Idle),
        }
    }

    pub async fn state(&self) -> PublishState {
        self.state.read().await.clone()
    }

    /// Build the bundle for the current pack and sessions without sending it.
    pub async fn preview_bundle(
        &self,
        title: &str,
        cards: &CardStore,
        sessions: &SessionManager,
    ) -> Bundle {
        let cards = cards.cards().await;
        let sessions = sessions.snapshot().await;
        BundleAssembler::new(&self.agents, &self.created_by, &self.redactions).assemble(
            title,
            &cards,
            &sessions,
            Utc::now(),
        )
    }

    /// Publish the pack. Refused while the pack is empty.
    ///
    /// Overlapping calls are not serialized; the last one to finish sets the
    /// final state.
    pub async fn publish(
        &self,
        title: &str,
        cards: &CardStore,
        sessions: &SessionManager,
    ) -> PublishOutcome {
        if cards.is_empty().await {
            info!("Publish skipped: pack is empty");
            return PublishOutcome::Skipped;
        }

        *self.state.write().await = PublishState::Publishing;

        let bundle = self.preview_bundle(title, cards, sessions).await;
        info!(
            title = %bundle.title,
            sessions = bundle.source_sessions.len(),
            "Publishing spec bundle"
        );

        let request = DispatchRequest::SpecbundleCreate {
            bundle,
            ingest: true,
        };
        let (state, outcome) = match self.dispatcher.send(request).await {
            Ok(resp) => {
                info!("Spec bundle published");
                (
                    PublishState::Published(resp.clone()),
                    PublishOutcome::Published(resp),
                )
            }
            Err(e) => {
                warn!(error = %e, "Spec bundle publish failed");
                let resp = json!({ "error": "publish_failed" });
                (
                    PublishState::Failed(resp.clone()),
                    PublishOutcome::Failed(resp),
                )
            }
        };

        *self.state.write().await = state;
        outcome
    }
}
