//! Error taxonomy for provider calls.
//!
//! A [`RetrievalError`] means one provider failed one round. The orchestrator
//! downgrades it to an empty result list with a logged warning; it never
//! propagates past the discovery boundary. Only configuration problems at
//! startup are fatal, and those go through `anyhow` at the CLI layer.

use thiserror::Error;

/// A transient failure of a single provider call.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The provider's required configuration is absent. This is a routing
    /// signal (skip the channel), not a failure.
    #[error("provider '{0}' is not configured")]
    Unavailable(&'static str),

    /// The call exceeded the provider's configured deadline.
    #[error("provider '{provider}' timed out after {seconds}s")]
    Timeout { provider: &'static str, seconds: u64 },

    /// Transport-level failure (connect, TLS, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered 2xx but the payload did not parse.
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl RetrievalError {
    /// Status-code constructor that truncates the body for log hygiene.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > 200 {
            body.truncate(200);
        }
        RetrievalError::Status { status, body }
    }
}
