//! Session manager — fan-out, reply capture, active-session tracking.
//!
//! The session list is held as an `Arc<Vec<Session>>` and every mutation
//! swaps in a fresh vector, so snapshots taken by an in-flight publish never
//! observe a half-applied change.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::model::{Message, Role, Session};
use crate::config::AgentRegistry;

#[derive(Debug, Default)]
struct SessionsState {
    sessions: Arc<Vec<Session>>,
    active: Option<Uuid>,
}

/// Owns every session for the lifetime of the process.
pub struct SessionManager {
    agents: Arc<AgentRegistry>,
    state: RwLock<SessionsState>,
    selected: RwLock<Vec<String>>,
}

impl SessionManager {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self {
            agents,
            state: RwLock::new(SessionsState::default()),
            selected: RwLock::new(Vec::new()),
        }
    }

    /// Start with a fan-out selection already made.
    pub fn with_selection(self, selected: Vec<String>) -> Self {
        Self {
            selected: RwLock::new(selected),
            ..self
        }
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Title falls back to the raw id when the agent is not configured.
    fn build_session(&self, agent_id: &str, first_message: Option<Message>) -> Session {
        let title = self.agents.label_or_id(agent_id);
        let session = Session::new(agent_id, title);
        match first_message {
            Some(m) => session.with_first_message(m),
            None => session,
        }
    }

    /// Put new sessions at the front and, in the same swap, set the active one.
    async fn prepend(&self, new_sessions: &[Session], activate: Option<Uuid>) {
        let mut state = self.state.write().await;
        let mut next = Vec::with_capacity(new_sessions.len() + state.sessions.len());
        next.extend_from_slice(new_sessions);
        next.extend(state.sessions.iter().cloned());
        state.sessions = Arc::new(next);
        if let Some(id) = activate {
            state.active = Some(id);
        }
    }

    /// Open a session against a configured agent.
    ///
    /// Unknown agent ids are a caller error and produce nothing.
    pub async fn create_session(
        &self,
        agent_id: &str,
        first_message: Option<&str>,
    ) -> Option<Session> {
        let seed = first_message
            .filter(|m| !m.is_empty())
            .map(|m| Message::new(Role::User, m));

        if self.agents.get(agent_id).is_none() {
            debug!(agent_id = agent_id, "Ignoring session for unknown agent");
            return None;
        }
        let session = self.build_session(agent_id, seed);

        info!(session_id = %session.id, agent_id = agent_id, "Session created");
        self.prepend(std::slice::from_ref(&session), None).await;
        Some(session)
    }

    /// Send one prompt to every selected agent, one new session each.
    ///
    /// Duplicate ids yield duplicate sessions, and ids missing from the roster
    /// still get a session titled with the raw id. The first new session
    /// becomes active in the same swap that adds the batch. Blank prompts do
    /// nothing.
    pub async fn fan_out(&self, prompt: &str, selected_agent_ids: &[String]) -> Vec<Session> {
        if prompt.trim().is_empty() {
            debug!("Ignoring fan-out of empty prompt");
            return Vec::new();
        }

        let at = Utc::now();
        let created: Vec<Session> = selected_agent_ids
            .iter()
            .map(|id| self.build_session(id, Some(Message::at(Role::User, prompt, at))))
            .collect();

        let Some(first) = created.first() else {
            return created;
        };

        self.prepend(&created, Some(first.id)).await;

        info!(count = created.len(), "Prompt fanned out");
        created
    }

    /// Fan out to the current selection.
    pub async fn fan_out_selected(&self, prompt: &str) -> Vec<Session> {
        let selected = self.selected_agents().await;
        self.fan_out(prompt, &selected).await
    }

    /// Explicit "new session": first selected agent, else the first configured one.
    pub async fn new_session(&self) -> Option<Session> {
        let agent_id = {
            let selected = self.selected.read().await;
            selected
                .first()
                .cloned()
                .or_else(|| self.agents.first().map(|a| a.id.clone()))
        }?;

        let session = self.build_session(&agent_id, None);
        info!(session_id = %session.id, agent_id = %agent_id, "Session created");
        self.prepend(std::slice::from_ref(&session), Some(session.id)).await;
        Some(session)
    }

    /// Append to a session's transcript. Returns false for unknown ids.
    pub async fn append_message(&self, session_id: Uuid, role: Role, content: &str) -> bool {
        let mut state = self.state.write().await;
        if !state.sessions.iter().any(|s| s.id == session_id) {
            debug!(session_id = %session_id, "Ignoring append to unknown session");
            return false;
        }

        let next: Vec<Session> = state
            .sessions
            .iter()
            .map(|s| {
                if s.id != session_id {
                    return s.clone();
                }
                let mut updated = s.clone();
                updated.messages.push(Message::new(role, content));
                updated
            })
            .collect();
        state.sessions = Arc::new(next);

        debug!(session_id = %session_id, role = %role, "Message appended");
        true
    }

    /// Capture a pasted reply into the active session.
    pub async fn paste_into_active(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let Some(active) = self.active_id().await else {
            debug!("No active session to paste into");
            return false;
        };
        self.append_message(active, Role::Assistant, text).await
    }

    pub async fn latest_assistant_message(&self, session_id: Uuid) -> Option<Message> {
        let state = self.state.read().await;
        state
            .sessions
            .iter()
            .find(|s| s.id == session_id)?
            .latest_assistant_message()
            .cloned()
    }

    /// Make a session active. Unknown ids leave the current choice alone.
    pub async fn set_active(&self, session_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        if state.sessions.iter().any(|s| s.id == session_id) {
            state.active = Some(session_id);
            true
        } else {
            false
        }
    }

    pub async fn active_id(&self) -> Option<Uuid> {
        self.state.read().await.active
    }

    pub async fn active_session(&self) -> Option<Session> {
        let state = self.state.read().await;
        let active = state.active?;
        state.sessions.iter().find(|s| s.id == active).cloned()
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        let state = self.state.read().await;
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    /// Current session list, newest first.
    pub async fn snapshot(&self) -> Arc<Vec<Session>> {
        Arc::clone(&self.state.read().await.sessions)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.sessions.is_empty()
    }

    pub async fn selected_agents(&self) -> Vec<String> {
        self.selected.read().await.clone()
    }

    /// Add or remove an agent from the fan-out selection.
    pub async fn toggle_agent(&self, agent_id: &str) -> bool {
        let mut selected = self.selected.write().await;
        if let Some(pos) = selected.iter().position(|id| id == agent_id) {
            selected.remove(pos);
            false
        } else {
            selected.push(agent_id.to_string());
            true
        }
    }
}
