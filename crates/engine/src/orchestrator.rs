//! The orchestrator facade.
//!
//! An explicit, injectable instance owning the job store, request
//! queue, transport, and retry policy -- no process-wide singletons.
//! [`Orchestrator::run_job`] drives one envelope through
//! queue -> transport(+retry) -> store -> poll watcher to a terminal
//! state and hands the caller a [`JobHandle`] for the ride.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::{credentials, CoreError, JobEnvelope, ProviderId, SnapshotStore};
use lumen_providers::{adapter_for, ProviderAdapter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::audit::PayloadAudit;
use crate::config::EngineConfig;
use crate::error::{EngineError, TransportError};
use crate::events::{JobEvent, JobHandle};
use crate::poller;
use crate::queue::RequestQueue;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::store::JobStore;
use crate::transport::{HttpTransport, ProviderRequest, Transport};

/// Opaque credential lookup, injectable for tests.
pub type CredentialResolver =
    Arc<dyn Fn(ProviderId) -> Result<String, CoreError> + Send + Sync>;

/// Wires the engine's components together and runs jobs.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    store: Arc<JobStore>,
    audit: Arc<PayloadAudit>,
    queue: Arc<RequestQueue>,
    retry: RetryPolicy,
    poll_interval: Duration,
    resolve_credential: CredentialResolver,
}

impl Orchestrator {
    /// Build an orchestrator over the real HTTP transport.
    pub fn with_http(config: &EngineConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(config.request_timeout));
        Self::new(transport, Arc::new(PayloadAudit::new()), config)
    }

    /// Build an orchestrator over an injected transport (tests use a
    /// scripted fake here).
    pub fn new(
        transport: Arc<dyn Transport>,
        audit: Arc<PayloadAudit>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            transport,
            store: Arc::new(JobStore::new()),
            audit,
            queue: Arc::new(RequestQueue::new(config.max_concurrent_submissions)),
            retry: RetryPolicy {
                base_delay: config.retry_base_delay,
                max_retries: config.max_retries,
            },
            poll_interval: config.poll_interval,
            resolve_credential: Arc::new(credentials::resolve_credential),
        }
    }

    /// Replace the credential resolver (tests, alternate key sources).
    pub fn with_credential_resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolve_credential = resolver;
        self
    }

    /// The shared job store.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// The request-payload audit trail.
    pub fn audit(&self) -> &Arc<PayloadAudit> {
        &self.audit
    }

    /// Submit one envelope and follow it to a terminal state.
    ///
    /// Configuration problems (missing credential, unusable
    /// parameters) fail here, before any network call. Everything
    /// after that -- submit failures, poll results, the terminal state --
    /// arrives on the returned handle's event stream.
    pub async fn run_job(&self, envelope: JobEnvelope) -> Result<JobHandle, EngineError> {
        let adapter = adapter_for(envelope.provider);
        let token = (self.resolve_credential)(envelope.provider)?;
        let body = adapter
            .build_submit_body(&envelope.parameters)
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;

        // The constructed body enters the audit trail before any
        // network traffic, so the record exists whatever happens next.
        self.audit.record(&body).await;

        // Fresh-session reset: finished responses from earlier batches
        // are dropped before new work starts. Active jobs survive.
        self.store.clear_completed().await;

        let (events, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tracing::info!(
            envelope_id = %envelope.id,
            provider = %envelope.provider,
            "Submitting job",
        );

        let task = tokio::spawn(submit_and_watch(SubmissionContext {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            retry: self.retry.clone(),
            poll_interval: self.poll_interval,
            adapter,
            token,
            body,
            envelope_id: envelope.id.clone(),
            events,
            cancel: cancel.clone(),
        }));

        Ok(JobHandle::new(envelope.id, receiver, cancel, task))
    }

    /// Ask the provider to cancel a job, by server-assigned id.
    ///
    /// Single attempt, no retry. The job's watcher observes the
    /// `canceled` status on its next tick and terminates normally.
    pub async fn cancel_remote(
        &self,
        provider: ProviderId,
        job_id: &str,
    ) -> Result<(), EngineError> {
        let state = self.store.get(job_id).await.ok_or_else(|| {
            EngineError::InvalidRequest(format!("unknown job id: {job_id}"))
        })?;
        let token = (self.resolve_credential)(provider)?;
        let request = ProviderRequest::post_empty(&state.cancel_uri, token);
        self.transport.send(&request).await?;
        tracing::info!(job_id, "Cancel requested");
        Ok(())
    }

    /// Persist response history and the payload audit trail.
    pub async fn persist_state(&self, snapshots: &dyn SnapshotStore) -> Result<(), CoreError> {
        self.store.persist_history(snapshots).await?;
        self.audit.persist_to(snapshots).await
    }

    /// Restore response history and the payload audit trail. Returns
    /// the number of history entries recovered.
    pub async fn restore_state(&self, snapshots: &dyn SnapshotStore) -> Result<usize, CoreError> {
        self.audit.load_from(snapshots).await?;
        self.store.load_history(snapshots).await
    }
}

/// Everything one job's task needs, moved in at spawn time.
struct SubmissionContext {
    transport: Arc<dyn Transport>,
    store: Arc<JobStore>,
    queue: Arc<RequestQueue>,
    retry: RetryPolicy,
    poll_interval: Duration,
    adapter: &'static dyn ProviderAdapter,
    token: String,
    body: Vec<u8>,
    envelope_id: String,
    events: mpsc::UnboundedSender<JobEvent>,
    cancel: CancellationToken,
}

/// Drive one job: bounded submit with retry, then poll to terminal.
async fn submit_and_watch(ctx: SubmissionContext) {
    let request = ProviderRequest::post(ctx.adapter.submit_url(), &ctx.token, ctx.body);

    // The queue slot covers the whole transport+retry span; it frees
    // when the submission resolves, not merely when one call returns.
    let submit_result = {
        let _permit = ctx.queue.acquire().await;
        send_with_retry(ctx.transport.as_ref(), &request, &ctx.retry).await
    };
    let cancelled = ctx.cancel.is_cancelled();

    let bytes = match submit_result {
        Ok(bytes) => bytes,
        Err(err) => {
            if !cancelled {
                let _ = ctx.events.send(JobEvent::Failed(err.into()));
            }
            return;
        }
    };

    let mut state = match ctx.adapter.parse_submit_response(&bytes) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(
                envelope_id = %ctx.envelope_id,
                error = %err,
                raw = %String::from_utf8_lossy(&bytes),
                "Undecodable submit response",
            );
            if !cancelled {
                let _ = ctx.events.send(JobEvent::Failed(EngineError::Transport(
                    TransportError::Decode(err.to_string()),
                )));
            }
            return;
        }
    };

    state.request_id = Some(ctx.envelope_id.clone());
    let terminal = state.is_terminal();
    ctx.store.upsert(state.clone()).await;
    if cancelled {
        return;
    }

    if terminal {
        // Rare but legal: the provider finished the job within the
        // submit exchange. Skip polling entirely.
        ctx.store.append_history(&state).await;
        let _ = ctx.events.send(JobEvent::Completed(state));
        return;
    }

    let _ = ctx.events.send(JobEvent::Update(state.clone()));

    poller::watch(
        ctx.transport.as_ref(),
        ctx.adapter,
        ctx.store.as_ref(),
        &ctx.events,
        &ctx.cancel,
        ctx.poll_interval,
        &ctx.token,
        &ctx.envelope_id,
        &state,
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// A transport that must never be reached.
    struct UnreachableTransport;

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn send(&self, _request: &ProviderRequest) -> Result<Vec<u8>, TransportError> {
            panic!("configuration errors must surface before any network call");
        }
    }

    fn orchestrator_with(resolver: CredentialResolver) -> Orchestrator {
        Orchestrator::new(
            Arc::new(UnreachableTransport),
            Arc::new(PayloadAudit::new()),
            &EngineConfig::default(),
        )
        .with_credential_resolver(resolver)
    }

    #[tokio::test]
    async fn missing_credential_fails_before_network() {
        let orchestrator = orchestrator_with(Arc::new(|provider| {
            Err(CoreError::MissingCredential {
                provider,
                env_key: "REPLICATE_API_TOKEN",
            })
        }));
        let envelope = JobEnvelope::new(ProviderId::Sdxl, serde_json::json!({"prompt": "x"}));

        let err = orchestrator.run_job(envelope).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[tokio::test]
    async fn bad_parameters_fail_before_network() {
        let orchestrator = orchestrator_with(Arc::new(|_| Ok("tok".into())));
        let envelope = JobEnvelope::new(ProviderId::Flux, serde_json::json!({"steps": 30}));

        let err = orchestrator.run_job(envelope).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn cancel_remote_requires_a_known_job() {
        let orchestrator = orchestrator_with(Arc::new(|_| Ok("tok".into())));
        let err = orchestrator
            .cancel_remote(ProviderId::Sdxl, "never-seen")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }
}
