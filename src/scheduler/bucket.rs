//! Per-route FIFO queues drained by single-admission workers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time;

use super::attempt;
use super::gate::PauseGate;
use super::manager::Shared;
use super::request::{Request, RouteKey};

/// Handle to one route's queue. The receiving side lives inside the worker
/// task; buckets are never torn down, an idle worker just parks on an empty
/// channel for the life of the process.
pub(crate) struct Bucket {
    tx: mpsc::Sender<Request>,
    gate: Arc<PauseGate>,
}

impl Bucket {
    /// Create the queue and spawn its worker.
    pub(crate) fn spawn(key: RouteKey, shared: Arc<Shared>) -> Self {
        // tokio channels require a capacity of at least one
        let (tx, rx) = mpsc::channel(shared.config.queue_capacity.max(1));
        let gate = Arc::new(PauseGate::new());
        tokio::spawn(run(key, rx, Arc::clone(&gate), shared));
        Self { tx, gate }
    }

    /// Non-blocking enqueue for caller submissions. Hands the request back
    /// on a full queue so the caller can be failed with backpressure.
    pub(crate) fn try_enqueue(&self, request: Request) -> Result<(), Request> {
        self.tx.try_send(request).map_err(|err| match err {
            mpsc::error::TrySendError::Full(request) => request,
            mpsc::error::TrySendError::Closed(request) => request,
        })
    }

    /// A sender for engine-internal resubmission, which waits for a slot
    /// instead of failing (always from a detached task, never a worker).
    pub(crate) fn sender(&self) -> mpsc::Sender<Request> {
        self.tx.clone()
    }

    pub(crate) fn gate(&self) -> Arc<PauseGate> {
        Arc::clone(&self.gate)
    }
}

/// Worker loop: strictly FIFO, at most one attempt in flight.
async fn run(
    key: RouteKey,
    mut rx: mpsc::Receiver<Request>,
    gate: Arc<PauseGate>,
    shared: Arc<Shared>,
) {
    tracing::debug!(route = %key, "bucket worker started");

    while let Some(request) = rx.recv().await {
        admit(&shared.global, &gate).await;
        attempt::run_attempt(request, &key, &gate, &shared).await;
    }
}

/// Wait until both the global and the bucket deadline have elapsed. Either
/// may be extended while we sleep, so re-check both after every wake-up.
async fn admit(global: &PauseGate, bucket: &PauseGate) {
    loop {
        let deadline = [global.deadline(), bucket.deadline()]
            .into_iter()
            .flatten()
            .max();

        match deadline {
            Some(until) => time::sleep_until(until).await,
            None => break,
        }
    }
}
