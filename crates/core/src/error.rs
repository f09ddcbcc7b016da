use crate::provider::ProviderId;

/// Domain-level errors raised before any network traffic happens.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No credential found for provider {provider} (set {env_key} or add it to the credentials file)")]
    MissingCredential {
        provider: ProviderId,
        env_key: &'static str,
    },

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}
