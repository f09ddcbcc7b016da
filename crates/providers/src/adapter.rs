//! The provider adapter seam.
//!
//! The engine is generic over one small interface: build a submit body,
//! decode a submit response, decode a poll response. Everything else
//! (queueing, retry, polling, state tracking) is shared, so adding a
//! provider means adding one adapter, not another orchestration copy.

use lumen_core::{ProviderId, RemoteJobState};

use crate::chat::LlamaChatAdapter;
use crate::image::{FluxAdapter, PlaygroundAdapter, SdxlAdapter};

/// Errors from building requests or decoding provider responses.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The caller's parameter payload is unusable for this provider.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The response body was not valid JSON for the expected shape.
    #[error("Malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded, but its `output` field has a shape this
    /// adapter does not understand.
    #[error("Unexpected output shape: {0}")]
    UnexpectedOutput(String),
}

/// Codec between opaque job parameters and one provider's wire format.
///
/// Implementations are stateless and cheap; the engine holds them as
/// `&'static dyn ProviderAdapter`.
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks for.
    fn provider(&self) -> ProviderId;

    /// Absolute URL for job submission.
    fn submit_url(&self) -> String;

    /// Serialize the caller's parameters into a submit request body.
    fn build_submit_body(&self, params: &serde_json::Value) -> Result<Vec<u8>, AdapterError>;

    /// Decode a submit response body into a job state.
    fn parse_submit_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError>;

    /// Decode a poll response body into a job state.
    fn parse_poll_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError>;
}

/// Look up the adapter for a provider.
pub fn adapter_for(provider: ProviderId) -> &'static dyn ProviderAdapter {
    static SDXL: SdxlAdapter = SdxlAdapter;
    static FLUX: FluxAdapter = FluxAdapter;
    static PLAYGROUND: PlaygroundAdapter = PlaygroundAdapter;
    static LLAMA_CHAT: LlamaChatAdapter = LlamaChatAdapter;

    match provider {
        ProviderId::Sdxl => &SDXL,
        ProviderId::Flux => &FLUX,
        ProviderId::Playground => &PLAYGROUND,
        ProviderId::LlamaChat => &LLAMA_CHAT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_provider() {
        for provider in ProviderId::ALL {
            assert_eq!(adapter_for(provider).provider(), provider);
        }
    }

    #[test]
    fn submit_urls_are_absolute() {
        for provider in ProviderId::ALL {
            let url = adapter_for(provider).submit_url();
            assert!(url.starts_with("https://"), "bad url: {url}");
        }
    }
}
