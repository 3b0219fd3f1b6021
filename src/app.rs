//! Application state — every component, explicitly owned and shared by `Arc`.

use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cards::{Card, CardStore};
use crate::config::{AgentRegistry, AppConfig, DEFAULT_SELECTED_AGENTS, PROVIDERS};
use crate::context::ContextLookup;
use crate::credentials::CredentialCache;
use crate::diagram::{DiagramHelper, PreviewRegistry, Renderer};
use crate::dispatch::Dispatcher;
use crate::publish::{DEFAULT_PACK_TITLE, PublishOutcome, Publisher};
use crate::sessions::SessionManager;

pub struct AppState {
    pub config: AppConfig,
    pub agents: Arc<AgentRegistry>,
    pub sessions: SessionManager,
    pub cards: Arc<CardStore>,
    pub credentials: CredentialCache,
    pub publisher: Publisher,
    pub context: ContextLookup,
    pub previews: PreviewRegistry,
    pub helper: DiagramHelper,
    pack_title: RwLock<String>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        dispatcher: Arc<dyn Dispatcher>,
        renderer: Arc<dyn Renderer>,
    ) -> Arc<Self> {
        let agents = Arc::new(AgentRegistry::default());
        let sessions = SessionManager::new(Arc::clone(&agents))
            .with_selection(DEFAULT_SELECTED_AGENTS.iter().map(|s| s.to_string()).collect());
        let credentials = CredentialCache::new(
            Arc::clone(&dispatcher),
            PROVIDERS.iter().map(|s| s.to_string()).collect(),
        );
        let publisher = Publisher::new(
            Arc::clone(&dispatcher),
            Arc::clone(&agents),
            config.created_by.clone(),
            config.default_redactions.clone(),
        );

        Arc::new(Self {
            agents,
            sessions,
            cards: CardStore::new(),
            credentials,
            publisher,
            context: ContextLookup::new(dispatcher),
            previews: PreviewRegistry::new(Arc::clone(&renderer)),
            helper: DiagramHelper::new(renderer),
            pack_title: RwLock::new(DEFAULT_PACK_TITLE.to_string()),
            config,
        })
    }

    pub async fn pack_title(&self) -> String {
        self.pack_title.read().await.clone()
    }

    /// Blank titles fall back to the default.
    pub async fn set_pack_title(&self, title: &str) {
        let title = title.trim();
        *self.pack_title.write().await = if title.is_empty() {
            DEFAULT_PACK_TITLE.to_string()
        } else {
            title.to_string()
        };
    }

    /// Capture the active session's latest reply into the pack.
    pub async fn capture_active(&self) -> Option<Card> {
        let session = self.sessions.active_session().await?;
        self.cards
            .capture_reply(&session, &self.config.default_redactions)
            .await
    }

    pub async fn publish(&self) -> PublishOutcome {
        let title = self.pack_title().await;
        self.publisher
            .publish(&title, &self.cards, &self.sessions)
            .await
    }

    /// Re-sync diagram previews against the pack right now.
    pub async fn sync_previews(&self) {
        let cards = self.cards.cards().await;
        self.previews.sync(&cards);
    }
}

/// Keep per-card previews in step with pack changes.
///
/// Holds the state weakly; the task ends once the last `Arc<AppState>` is gone.
pub fn spawn_preview_sync(state: &Arc<AppState>) -> JoinHandle<()> {
    let mut rx = state.cards.subscribe();
    let state: Weak<AppState> = Arc::downgrade(state);
    tokio::spawn(async move {
        loop {
            let received = rx.recv().await;
            let Some(state) = state.upgrade() else {
                break;
            };
            match received {
                Ok(event) => {
                    debug!(?event, "Pack changed, syncing previews");
                    state.sync_previews().await;
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Preview sync lagged, resyncing");
                    state.sync_previews().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Preview sync stopped");
    })
}
