//! Job status enum and state machine.
//!
//! Every hosted provider reports the same lifecycle over the wire:
//! `queued`/`starting` -> `processing` -> `succeeded`/`failed`/`canceled`.
//! Terminal states have no outgoing transitions.

use serde::{Deserialize, Serialize};

/// Remote status of a generation job, as reported by the provider.
///
/// Wire names are lowercase (`"queued"`, `"succeeded"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the provider, waiting for a worker.
    Queued,
    /// A worker is booting the model.
    Starting,
    /// The model is running.
    Processing,
    /// Finished with outputs.
    Succeeded,
    /// Finished with a provider-reported error.
    Failed,
    /// Canceled by the caller (or the provider).
    Canceled,
}

impl JobStatus {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Active states are the ones worth polling.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Lowercase wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// Returns the set of statuses reachable from `self`.
    ///
    /// Terminal states return an empty slice.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        use JobStatus::*;
        match self {
            Queued => &[Starting, Processing, Succeeded, Failed, Canceled],
            Starting => &[Processing, Succeeded, Failed, Canceled],
            Processing => &[Succeeded, Failed, Canceled],
            Succeeded | Failed | Canceled => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    ///
    /// Re-reporting the same status is always allowed (polling sees the
    /// same state many times in a row).
    pub fn can_transition(self, to: JobStatus) -> bool {
        self == to || self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- terminal / active ----------------------------------------------------

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
    }

    #[test]
    fn active_states() {
        assert!(JobStatus::Queued.is_active());
        assert!(JobStatus::Starting.is_active());
        assert!(JobStatus::Processing.is_active());
    }

    // -- transitions ----------------------------------------------------------

    #[test]
    fn queued_to_processing() {
        assert!(JobStatus::Queued.can_transition(JobStatus::Processing));
    }

    #[test]
    fn starting_to_processing() {
        assert!(JobStatus::Starting.can_transition(JobStatus::Processing));
    }

    #[test]
    fn processing_to_succeeded() {
        assert!(JobStatus::Processing.can_transition(JobStatus::Succeeded));
    }

    #[test]
    fn processing_to_canceled() {
        assert!(JobStatus::Processing.can_transition(JobStatus::Canceled));
    }

    #[test]
    fn same_status_is_allowed() {
        assert!(JobStatus::Processing.can_transition(JobStatus::Processing));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(JobStatus::Succeeded.valid_transitions().is_empty());
        assert!(JobStatus::Failed.valid_transitions().is_empty());
        assert!(JobStatus::Canceled.valid_transitions().is_empty());
    }

    #[test]
    fn succeeded_to_processing_invalid() {
        assert!(!JobStatus::Succeeded.can_transition(JobStatus::Processing));
    }

    #[test]
    fn failed_to_queued_invalid() {
        assert!(!JobStatus::Failed.can_transition(JobStatus::Queued));
    }

    #[test]
    fn processing_to_queued_invalid() {
        assert!(!JobStatus::Processing.can_transition(JobStatus::Queued));
    }

    // -- serde wire names -----------------------------------------------------

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
    }

    #[test]
    fn deserializes_lowercase() {
        let status: JobStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, JobStatus::Canceled);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(JobStatus::Starting.to_string(), "starting");
    }
}
