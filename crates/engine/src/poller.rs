//! Per-job status polling.
//!
//! One watcher per active job re-checks the provider on a fixed
//! interval until the job reaches a terminal state. Poll ticks are
//! single-attempt: a transport failure mid-poll surfaces as the job's
//! terminal outcome instead of being retried (only submissions retry).

use std::time::Duration;

use lumen_core::RemoteJobState;
use lumen_providers::ProviderAdapter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, TransportError};
use crate::events::JobEvent;
use crate::store::JobStore;
use crate::transport::{ProviderRequest, Transport};

/// Follow a job to its terminal state.
///
/// Ticks every `poll_interval`, starting immediately. Each tick GETs
/// the job's poll URI, decodes it through the adapter, raises the
/// reported progress to the running maximum, and applies the state to
/// the store before emitting an event.
///
/// Cancellation is cooperative: the in-flight request is not aborted,
/// and its eventual response is still applied to the store, but no
/// event fires after the token triggers and no further tick runs.
#[allow(clippy::too_many_arguments)]
pub async fn watch(
    transport: &dyn Transport,
    adapter: &'static dyn ProviderAdapter,
    store: &JobStore,
    events: &mpsc::UnboundedSender<JobEvent>,
    cancel: &CancellationToken,
    poll_interval: Duration,
    bearer_token: &str,
    request_id: &str,
    initial: &RemoteJobState,
) {
    let poll_uri = initial.poll_uri.clone();
    let job_id = initial.id.clone();
    let mut max_progress = initial.progress_percent;
    let mut ticker = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Poll watch cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let request = ProviderRequest::get(&poll_uri, bearer_token);
        let result = transport.send(&request).await;
        // The token may have triggered while the request was in flight.
        let cancelled = cancel.is_cancelled();

        match result {
            Ok(bytes) => match adapter.parse_poll_response(&bytes) {
                Ok(mut state) => {
                    state.request_id = Some(request_id.to_string());
                    max_progress = match (max_progress, state.progress_percent) {
                        (Some(current), Some(fresh)) => Some(current.max(fresh)),
                        (current, fresh) => current.or(fresh),
                    };
                    state.progress_percent = max_progress;

                    let terminal = state.is_terminal();
                    store.upsert(state.clone()).await;

                    if cancelled {
                        return;
                    }
                    if terminal {
                        tracing::info!(
                            job_id = %job_id,
                            status = %state.status,
                            "Job reached terminal state",
                        );
                        store.append_history(&state).await;
                        let _ = events.send(JobEvent::Completed(state));
                        return;
                    }
                    let _ = events.send(JobEvent::Update(state));
                }
                Err(err) => {
                    // Keep the raw payload in the log for diagnosis.
                    tracing::error!(
                        job_id = %job_id,
                        error = %err,
                        raw = %String::from_utf8_lossy(&bytes),
                        "Undecodable poll response",
                    );
                    if cancelled {
                        return;
                    }
                    let _ = events.send(JobEvent::Failed(EngineError::Transport(
                        TransportError::Decode(err.to_string()),
                    )));
                    return;
                }
            },
            Err(err) => {
                tracing::error!(job_id = %job_id, error = %err, "Poll request failed");
                if cancelled {
                    return;
                }
                let _ = events.send(JobEvent::Failed(err.into()));
                return;
            }
        }
    }
}
