//! Per-job event stream and handle.
//!
//! Each submitted job gets its own task; callers follow it through the
//! [`JobHandle`]'s event receiver. A job emits any number of
//! [`JobEvent::Update`]s followed by exactly one terminal event --
//! [`JobEvent::Completed`] when a remote terminal state was reached
//! (including provider-reported failure and cancellation, carried in
//! the state's status), or [`JobEvent::Failed`] when the engine could
//! not drive the job to a remote terminal state at all.

use lumen_core::RemoteJobState;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// Progress and completion notifications for one job.
#[derive(Debug)]
pub enum JobEvent {
    /// A fresh non-terminal observation (submit ack or poll tick).
    Update(RemoteJobState),

    /// The job reached a remote terminal state: `succeeded`, `failed`,
    /// or `canceled`. Inspect the state's status and `error_message`.
    Completed(RemoteJobState),

    /// The engine gave up locally: retries exhausted, malformed
    /// response, or a poll exchange failed.
    Failed(EngineError),
}

/// Caller's handle to a running job.
///
/// Dropping the handle does not cancel the job; call
/// [`JobHandle::cancel`] for that. Cancellation is cooperative: an
/// in-flight request is not aborted, but no event fires after the
/// token is triggered and no further poll tick is scheduled.
#[derive(Debug)]
pub struct JobHandle {
    /// Client-generated envelope id this handle tracks.
    pub envelope_id: String,
    events: mpsc::UnboundedReceiver<JobEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub(crate) fn new(
        envelope_id: String,
        events: mpsc::UnboundedReceiver<JobEvent>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            envelope_id,
            events,
            cancel,
            task,
        }
    }

    /// Receive the next event, or `None` once the job task is done and
    /// the stream is drained.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Stop watching: no events after this, no further poll ticks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The job's cancellation token, for wiring into callers' own
    /// shutdown paths.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the job task to finish (it finishes on terminal event
    /// or cancellation).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
