//! HTTP transport: one request, one classified outcome.
//!
//! [`HttpTransport`] wraps a shared [`reqwest::Client`] with a fixed
//! request timeout and maps every response into the
//! [`TransportError`] taxonomy. It performs exactly one attempt per
//! call; retrying is the [`RetryPolicy`](crate::retry::RetryPolicy)'s
//! job, and polling deliberately bypasses retry altogether.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// HTTP methods the providers' contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outbound provider request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Bearer token for the `Authorization` header.
    pub bearer_token: String,
    /// JSON body bytes for POST requests.
    pub body: Option<Vec<u8>>,
}

impl ProviderRequest {
    /// Build a GET request (status polling).
    pub fn get(url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            bearer_token: bearer_token.into(),
            body: None,
        }
    }

    /// Build a POST request with a JSON body (submission).
    pub fn post(
        url: impl Into<String>,
        bearer_token: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            bearer_token: bearer_token.into(),
            body: Some(body),
        }
    }

    /// Build a bodyless POST request (cancellation).
    pub fn post_empty(url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            bearer_token: bearer_token.into(),
            body: None,
        }
    }
}

/// Executes a single HTTP exchange.
///
/// Object-safe so tests can substitute a scripted fake for the real
/// network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one attempt and return the raw response body.
    async fn send(&self, request: &ProviderRequest) -> Result<Vec<u8>, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout.
    ///
    /// The client is built once and shared; connection pooling is
    /// reqwest's concern.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ProviderRequest) -> Result<Vec<u8>, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        builder = builder.bearer_auth(&request.bearer_token);
        if let Some(body) = &request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().await.map_err(classify_request_error)?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::NetworkUnreachable(e.to_string()))?;

        match classify_status(status, &bytes) {
            None => Ok(bytes.to_vec()),
            Some(err) => {
                tracing::warn!(status, url = %request.url, error = %err, "Provider request failed");
                Err(err)
            }
        }
    }
}

/// Map a reqwest send error into the transport taxonomy.
fn classify_request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::NetworkTimeout
    } else {
        TransportError::NetworkUnreachable(err.to_string())
    }
}

/// Classify an HTTP status code. `None` means success (2xx).
pub fn classify_status(status: u16, body: &[u8]) -> Option<TransportError> {
    match status {
        200..=299 => None,
        401 => Some(TransportError::Unauthorized),
        403 => Some(TransportError::Forbidden),
        429 => Some(TransportError::RateLimited),
        500..=599 => Some(TransportError::ServerError { status }),
        _ => Some(TransportError::ClientError {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}
