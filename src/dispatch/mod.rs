//! Dispatch client — one envelope POST per call to `<base>/v1/vos_dispatch`.
//!
//! - `envelope` — wire envelope and the typed `(target, op)` request union
//! - `client` — reqwest transport and the startup health probe

pub mod client;
pub mod envelope;
#[cfg(test)]
pub(crate) mod stub;

pub use client::HttpDispatcher;
pub use envelope::{DispatchRequest, Envelope, Target};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DispatchError;

/// Sends envelopes and returns the decoded response body untouched.
///
/// No retries, no schema checks: whatever JSON comes back is the result.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, envelope: Envelope) -> Result<Value, DispatchError>;

    /// Lower a typed request and dispatch it.
    async fn send(&self, request: DispatchRequest) -> Result<Value, DispatchError> {
        let envelope = request.into_envelope()?;
        self.dispatch(envelope).await
    }
}
