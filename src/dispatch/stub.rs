//! In-process dispatcher for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{Dispatcher, Envelope};
use crate::error::DispatchError;

/// Answers from a closure and records every envelope it sees.
pub(crate) struct StubBackend<F> {
    respond: F,
    seen: Mutex<Vec<Envelope>>,
}

impl<F> StubBackend<F>
where
    F: Fn(&Envelope) -> Result<Value, DispatchError> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Arc<Self> {
        Arc::new(Self {
            respond,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn ops(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|e| e.op.clone()).collect()
    }

    pub(crate) fn envelopes(&self) -> Vec<Envelope> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> Dispatcher for StubBackend<F>
where
    F: Fn(&Envelope) -> Result<Value, DispatchError> + Send + Sync,
{
    async fn dispatch(&self, envelope: Envelope) -> Result<Value, DispatchError> {
        let result = (self.respond)(&envelope);
        self.seen.lock().unwrap().push(envelope);
        result
    }
}

pub(crate) fn transport_error() -> DispatchError {
    DispatchError::Transport {
        url: "http://127.0.0.1:9/v1/vos_dispatch".into(),
        reason: "connection refused".into(),
    }
}
