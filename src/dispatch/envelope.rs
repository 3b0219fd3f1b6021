//! Wire envelope and the typed request union that compiles down to it.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::bundle::Bundle;
use crate::error::DispatchError;

/// Account name every credential is stored under.
pub const DEFAULT_ACCOUNT: &str = "default";

/// The `{target, op, payload}` body posted to the dispatch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub target: String,
    pub op: String,
    pub payload: Value,
}

impl Envelope {
    pub fn new(target: impl Into<String>, op: impl Into<String>, payload: Value) -> Self {
        Self {
            target: target.into(),
            op: op.into(),
            payload,
        }
    }
}

/// Backend services reachable through the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    OpencodePm,
    ContextService,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpencodePm => "opencode_pm",
            Self::ContextService => "context_service",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every `(target, op)` pair this client sends.
#[derive(Debug, Clone)]
pub enum DispatchRequest {
    /// Publish a bundle.
    SpecbundleCreate { bundle: Bundle, ingest: bool },
    /// Ask whether a credential is stored.
    SecretsGet { provider: String, account: String },
    /// Store a credential.
    SecretsSet {
        provider: String,
        account: String,
        key: SecretString,
    },
    /// Look up related knowledge-object refs for a path.
    ContextFetch { path: String },
}

impl DispatchRequest {
    pub fn secrets_get(provider: impl Into<String>) -> Self {
        Self::SecretsGet {
            provider: provider.into(),
            account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    pub fn secrets_set(provider: impl Into<String>, key: SecretString) -> Self {
        Self::SecretsSet {
            provider: provider.into(),
            account: DEFAULT_ACCOUNT.to_string(),
            key,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Self::SpecbundleCreate { .. } | Self::SecretsGet { .. } | Self::SecretsSet { .. } => {
                Target::OpencodePm
            }
            Self::ContextFetch { .. } => Target::ContextService,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            Self::SpecbundleCreate { .. } => "specbundle.create",
            Self::SecretsGet { .. } => "secrets.get",
            Self::SecretsSet { .. } => "secrets.set",
            Self::ContextFetch { .. } => "context.fetch",
        }
    }

    /// Lower into the wire envelope. The credential is exposed only here.
    pub fn into_envelope(self) -> Result<Envelope, DispatchError> {
        let target = self.target();
        let op = self.op();
        let payload = match self {
            Self::SpecbundleCreate { bundle, ingest } => json!({
                "bundle": serde_json::to_value(&bundle)?,
                "ingest": ingest,
            }),
            Self::SecretsGet { provider, account } => json!({
                "provider": provider,
                "account": account,
            }),
            Self::SecretsSet {
                provider,
                account,
                key,
            } => json!({
                "provider": provider,
                "account": account,
                "key": key.expose_secret(),
            }),
            Self::ContextFetch { path } => json!({ "path": path }),
        };
        Ok(Envelope::new(target.as_str(), op, payload))
    }
}

/// JavaScript-style truthiness, used where the backend's booleans may be loose.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `payload.exists` of a `secrets.get` response; anything missing reads as absent.
pub fn secret_exists(response: &Value) -> bool {
    response
        .get("payload")
        .and_then(|p| p.get("exists"))
        .is_some_and(truthy)
}

/// Success marker for `secrets.set`: `op == "secrets.ok"` or `ok: true`.
pub fn is_secrets_ok(response: &Value) -> bool {
    let op_ok = response.get("op").and_then(Value::as_str) == Some("secrets.ok");
    let flag_ok = response.get("ok").and_then(Value::as_bool) == Some(true);
    op_ok || flag_ok
}
