//! Admission control for outbound submissions.
//!
//! At most `limit` submissions execute concurrently; the rest wait in
//! FIFO order. A slot covers the whole transport-plus-retry span, so a
//! submission backing off between retries still occupies its slot --
//! the bound is on in-flight remote load, not raw calls.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded-concurrency gate over job submissions.
pub struct RequestQueue {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl RequestQueue {
    /// Create a queue admitting up to `limit` concurrent submissions.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Wait for a slot. The returned permit must be held for the whole
    /// submission (transport + retries) and dropped when it resolves.
    ///
    /// Waiters are served in arrival order.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("submission semaphore is never closed")
    }

    /// The configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
