//! The caller's request for one generation.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;
use crate::types::{JobId, Timestamp};

/// Immutable description of one generation request.
///
/// Built by the caller, handed to the orchestrator, and never mutated
/// after it is enqueued. The `id` is client-generated and unique; the
/// server assigns its own id once the job is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    /// Client-generated unique id (UUID v4).
    pub id: JobId,

    /// Target provider for this job.
    pub provider: ProviderId,

    /// Provider-specific parameters as a JSON object. The orchestrator
    /// treats this as opaque; the provider adapter gives it shape.
    pub parameters: serde_json::Value,

    /// When the caller created this envelope (UTC).
    pub submitted_at: Timestamp,
}

impl JobEnvelope {
    /// Create an envelope with a fresh client id and the current time.
    pub fn new(provider: ProviderId, parameters: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            parameters,
            submitted_at: chrono::Utc::now(),
        }
    }
}
