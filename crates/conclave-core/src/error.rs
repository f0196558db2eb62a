//! Shared error taxonomy (spec.md §4.8 "Error Handling").
//!
//! Six variants, each mapping to exactly one HTTP status and one
//! retryability verdict. Everything upstream of the transport layer works
//! in terms of `CoreError`; the transport is the only place that knows
//! about status codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    /// Upstream failed in a way that may succeed on retry (429, 5xx,
    /// network/timeout). The dispatcher is allowed to retry these.
    #[error("upstream transient error: {0}")]
    UpstreamTransient(String),

    /// Upstream failed in a way retrying cannot fix (401, 403, 404).
    #[error("upstream permanent error: {0}")]
    UpstreamPermanent(String),

    /// Anything else — a bug, not a caller mistake. Never retried, always
    /// surfaced as HTTP 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::Validation(_) => 400,
            CoreError::Auth(_) => 401,
            CoreError::Resolution(_) => 422,
            CoreError::UpstreamTransient(_) => 502,
            CoreError::UpstreamPermanent(_) => 502,
            CoreError::Internal(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::UpstreamTransient(_))
    }
}
