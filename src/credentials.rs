//! Credential status cache — per-provider "a key is stored" flags.
//!
//! Only presence is cached. Keys typed by the operator are held as
//! `SecretString` until a save succeeds, then dropped.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::dispatch::envelope::{is_secrets_ok, secret_exists};
use crate::dispatch::{DispatchRequest, Dispatcher};

/// What happened to a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Blank key; nothing was sent.
    Skipped,
    /// Backend confirmed; status was refreshed to `configured`.
    Saved { configured: bool },
    /// No success marker (or transport failure). Input and status untouched.
    Rejected,
}

pub struct CredentialCache {
    dispatcher: Arc<dyn Dispatcher>,
    providers: Vec<String>,
    status: RwLock<Arc<HashMap<String, bool>>>,
    inputs: RwLock<HashMap<String, SecretString>>,
}

impl CredentialCache {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, providers: Vec<String>) -> Self {
        let status = providers.iter().map(|p| (p.clone(), false)).collect();
        Self {
            dispatcher,
            providers,
            status: RwLock::new(Arc::new(status)),
            inputs: RwLock::new(HashMap::new()),
        }
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    async fn store_status(&self, provider: &str, exists: bool) {
        let mut status = self.status.write().await;
        let mut next = (**status).clone();
        next.insert(provider.to_string(), exists);
        *status = Arc::new(next);
    }

    /// Ask the backend whether a key is stored and cache the answer.
    ///
    /// Transport failures and malformed responses cache `false`, exactly like
    /// a confirmed absence. Callers cannot tell them apart.
    pub async fn refresh(&self, provider: &str) -> bool {
        let exists = match self
            .dispatcher
            .send(DispatchRequest::secrets_get(provider))
            .await
        {
            Ok(resp) => secret_exists(&resp),
            Err(e) => {
                warn!(provider = provider, error = %e, "Credential status query failed");
                false
            }
        };

        self.store_status(provider, exists).await;
        debug!(provider = provider, exists = exists, "Credential status refreshed");
        exists
    }

    /// Refresh every configured provider concurrently.
    pub async fn refresh_all(&self) -> HashMap<String, bool> {
        let results = join_all(self.providers.iter().map(|p| async move {
            let exists = self.refresh(p).await;
            (p.clone(), exists)
        }))
        .await;
        results.into_iter().collect()
    }

    /// Store a key. On the success marker, clear the pending input and refresh.
    pub async fn save(&self, provider: &str, raw_key: &str) -> SaveOutcome {
        let key = raw_key.trim();
        if key.is_empty() {
            debug!(provider = provider, "Ignoring blank key");
            return SaveOutcome::Skipped;
        }

        let request = DispatchRequest::secrets_set(provider, SecretString::from(key.to_string()));
        let resp: Value = match self.dispatcher.send(request).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(provider = provider, error = %e, "Credential save failed");
                return SaveOutcome::Rejected;
            }
        };

        if !is_secrets_ok(&resp) {
            warn!(provider = provider, "Credential save not acknowledged");
            return SaveOutcome::Rejected;
        }

        self.inputs.write().await.remove(provider);
        info!(provider = provider, "Credential stored");
        let configured = self.refresh(provider).await;
        SaveOutcome::Saved { configured }
    }

    /// Save whatever the operator typed for this provider.
    pub async fn save_input(&self, provider: &str) -> SaveOutcome {
        let pending = {
            let inputs = self.inputs.read().await;
            inputs.get(provider).map(|k| k.expose_secret().to_string())
        };
        match pending {
            Some(key) => self.save(provider, &key).await,
            None => SaveOutcome::Skipped,
        }
    }

    /// Hold a typed key until it is saved.
    pub async fn set_input(&self, provider: &str, raw_key: impl Into<String>) {
        self.inputs
            .write()
            .await
            .insert(provider.to_string(), SecretString::from(raw_key.into()));
    }

    pub async fn has_input(&self, provider: &str) -> bool {
        self.inputs.read().await.contains_key(provider)
    }

    pub async fn is_configured(&self, provider: &str) -> bool {
        self.status.read().await.get(provider).copied().unwrap_or(false)
    }

    pub async fn snapshot(&self) -> Arc<HashMap<String, bool>> {
        Arc::clone(&*self.status.read().await)
    }
}
