//! Context lookup — related knowledge-object refs for a spec path.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::DEFAULT_CONTEXT_PATH;
use crate::dispatch::{DispatchRequest, Dispatcher};

pub struct ContextLookup {
    dispatcher: Arc<dyn Dispatcher>,
    path: RwLock<String>,
    last: RwLock<Option<Value>>,
}

impl ContextLookup {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            path: RwLock::new(DEFAULT_CONTEXT_PATH.to_string()),
            last: RwLock::new(None),
        }
    }

    /// Path used by [`fetch_current`](Self::fetch_current).
    pub async fn path(&self) -> String {
        self.path.read().await.clone()
    }

    pub async fn set_path(&self, path: impl Into<String>) {
        *self.path.write().await = path.into();
    }

    /// Fetch context for `path` and keep the result.
    ///
    /// The response is stored verbatim; a transport failure stores
    /// `{"error": "context_fetch_failed"}` instead.
    pub async fn fetch(&self, path: &str) -> Value {
        let request = DispatchRequest::ContextFetch {
            path: path.to_string(),
        };
        let result = match self.dispatcher.send(request).await {
            Ok(resp) => {
                debug!(path = path, "Context fetched");
                resp
            }
            Err(e) => {
                warn!(path = path, error = %e, "Context fetch failed");
                json!({ "error": "context_fetch_failed" })
            }
        };

        *self.last.write().await = Some(result.clone());
        result
    }

    pub async fn fetch_current(&self) -> Value {
        let path = self.path().await;
        self.fetch(&path).await
    }

    /// Result of the most recent fetch.
    pub async fn last(&self) -> Option<Value> {
        self.last.read().await.clone()
    }
}
