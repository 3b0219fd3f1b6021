//! reqwest-backed dispatcher.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Dispatcher, Envelope};
use crate::error::DispatchError;

const DISPATCH_PATH: &str = "/v1/vos_dispatch";
const HEALTH_PATH: &str = "/v1/health";

/// Dispatcher talking to the project-management backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Probe `GET /v1/health`. Any 2xx is ready; everything else is offline.
    pub async fn health(&self) -> bool {
        let url = self.url(HEALTH_PATH);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(url = %url, "Backend is ready");
                true
            }
            Ok(resp) => {
                warn!(url = %url, status = %resp.status(), "Backend health probe failed");
                false
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Backend unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, envelope: Envelope) -> Result<Value, DispatchError> {
        let url = self.url(DISPATCH_PATH);
        debug!(target_service = %envelope.target, op = %envelope.op, "Dispatching envelope");

        let resp = self
            .client
            .post(&url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| DispatchError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.json::<Value>().await.map_err(|e| DispatchError::Decode {
            target: envelope.target.clone(),
            op: envelope.op.clone(),
            reason: e.to_string(),
        })?;

        debug!(op = %envelope.op, status = %status, "Dispatch response decoded");
        Ok(body)
    }
}
