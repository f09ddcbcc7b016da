//! Engine error taxonomy.
//!
//! [`TransportError`] classifies every way a single HTTP exchange can
//! fail; [`RetryPolicy`](crate::retry::RetryPolicy) consults
//! [`TransportError::is_retryable`] to decide whether a submission may
//! be re-attempted. [`EngineError`] is the caller-facing union.

use lumen_core::CoreError;

/// Outcome classification for one HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP 401 -- bad or expired credential. Never retried.
    #[error("Unauthorized (HTTP 401): check the provider API token")]
    Unauthorized,

    /// HTTP 403 -- the credential lacks access. Never retried.
    #[error("Forbidden (HTTP 403)")]
    Forbidden,

    /// HTTP 429 -- provider throttling. Retryable with backoff.
    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    /// HTTP 5xx -- provider-side failure. Retryable with backoff.
    #[error("Server error (HTTP {status})")]
    ServerError { status: u16 },

    /// Any other 4xx -- the request itself is wrong. Never retried.
    #[error("Client error (HTTP {status}): {body}")]
    ClientError { status: u16, body: String },

    /// The request did not complete within the transport timeout.
    #[error("Request timed out")]
    NetworkTimeout,

    /// Connection-level failure (DNS, refused, unreachable).
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The response body could not be decoded. Never retried.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the retry policy may schedule another attempt for this
    /// error. Auth, client, and decode failures surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServerError { .. }
                | Self::NetworkTimeout
                | Self::NetworkUnreachable(_)
        )
    }
}

/// Caller-facing error for a job that could not be driven to a remote
/// terminal state.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Missing credential or invalid endpoint -- raised before any
    /// network call.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// The caller's parameters were rejected by the provider adapter --
    /// raised before any network call.
    #[error("Invalid job parameters: {0}")]
    InvalidRequest(String),

    /// The submission (after retries) or a poll exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(TransportError::RateLimited.is_retryable());
        assert!(TransportError::ServerError { status: 503 }.is_retryable());
        assert!(TransportError::NetworkTimeout.is_retryable());
        assert!(TransportError::NetworkUnreachable("dns".into()).is_retryable());
    }

    #[test]
    fn fatal_classes() {
        assert!(!TransportError::Unauthorized.is_retryable());
        assert!(!TransportError::Forbidden.is_retryable());
        assert!(!TransportError::ClientError {
            status: 422,
            body: "bad input".into()
        }
        .is_retryable());
        assert!(!TransportError::Decode("truncated".into()).is_retryable());
    }
}
