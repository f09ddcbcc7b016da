//! The server's last-observed view of a job.

use serde::{Deserialize, Serialize};

use crate::status::JobStatus;
use crate::types::{JobId, Timestamp};

/// Authoritative remote state of a job, as last observed.
///
/// Created from the submit response, replaced wholesale on every poll
/// response. All writes funnel through the job store's single mutation
/// path; no component merges fields from two observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteJobState {
    /// Server-assigned job id.
    pub id: JobId,

    /// Client-generated envelope id this job originated from, when known.
    pub request_id: Option<JobId>,

    /// Last reported lifecycle status.
    pub status: JobStatus,

    /// Output URIs, in the order the provider produced them.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Provider-supplied failure message, if any.
    pub error_message: Option<String>,

    /// Best-known completion percentage in `0.0..=100.0`.
    pub progress_percent: Option<f32>,

    /// Raw provider log text accumulated so far.
    pub logs: Option<String>,

    /// URL to poll for status updates.
    pub poll_uri: String,

    /// URL to POST to for cancellation.
    pub cancel_uri: String,

    /// When this observation was applied (UTC).
    pub last_updated: Timestamp,
}

impl RemoteJobState {
    /// True once the job can no longer change state remotely.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
