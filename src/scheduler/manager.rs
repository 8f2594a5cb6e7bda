//! The scheduler: bucket ownership, admission entry point, global pause.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use reqwest::RequestBuilder;

use super::bucket::Bucket;
use super::gate::PauseGate;
use super::request::{Pending, Request, RequestFactory, RouteKey};
use crate::classify::{Classifier, HttpClassifier, RawOutcome};
use crate::config::SchedulerConfig;
use crate::error::{Result, SluiceError};

/// State shared between the scheduler handle, bucket workers, and detached
/// resubmission tasks.
pub(crate) struct Shared {
    pub(crate) config: SchedulerConfig,
    pub(crate) classifier: Box<dyn Classifier>,
    /// The application-wide throttle every bucket consults before admission.
    pub(crate) global: PauseGate,
    buckets: Mutex<HashMap<RouteKey, Bucket>>,
}

impl Shared {
    /// Run `f` against the bucket for `key`, creating it on first use.
    fn with_bucket<R>(self: &Arc<Self>, key: &RouteKey, f: impl FnOnce(&Bucket) -> R) -> R {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::spawn(key.clone(), Arc::clone(self)));
        f(bucket)
    }

    /// Re-enter a request at the back of its queue. Unlike a caller
    /// submission this waits for a slot: the request already held one once
    /// and must not be lost to a transiently full queue.
    pub(crate) async fn resubmit(self: &Arc<Self>, key: RouteKey, request: Request) {
        tracing::debug!(route = %key, id = request.id, "resubmitting request");
        let tx = self.with_bucket(&key, |bucket| bucket.sender());
        if let Err(rejected) = tx.send(request).await {
            // only possible during runtime teardown; the caller sees Abandoned
            tracing::debug!(route = %key, id = rejected.0.id, "bucket worker gone; dropping request");
        }
    }

    fn route_count(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }
}

/// Admission front door for calls against a rate-limited API.
///
/// One scheduler owns the global throttle and one FIFO bucket per route
/// key, each drained by a single worker so a route never has more than one
/// call in flight. Cheap to clone; clones share all of that state.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Build a scheduler with custom tunables and the default header-based
    /// classifier.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let classifier = HttpClassifier::new(config.min_retry_after);
        Self::with_classifier(config, classifier)
    }

    /// Build a scheduler with a custom [`Classifier`], for APIs whose limit
    /// signaling differs from the default header protocol.
    pub fn with_classifier(config: SchedulerConfig, classifier: impl Classifier + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                classifier: Box::new(classifier),
                global: PauseGate::new(),
                buckets: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Queue one request behind `key`'s route limit.
    ///
    /// Returns immediately; the caller suspends only when awaiting the
    /// returned [`Pending`]. The factory must be safely re-invocable — it
    /// is called again for every retry. Fails with
    /// [`SluiceError::Backpressure`] when the route's queue is at capacity;
    /// requests already queued are unaffected.
    pub fn submit<F, Fut>(&self, key: impl Into<RouteKey>, factory: F) -> Result<Pending>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RawOutcome> + Send + 'static,
    {
        let factory: RequestFactory = Box::new(move || Box::pin(factory()));
        self.submit_boxed(key.into(), factory)
    }

    /// Queue a prepared reqwest request.
    ///
    /// The builder must be cloneable (i.e. not carry a streaming body) so
    /// the call can be re-sent on retries.
    pub fn submit_request(&self, key: impl Into<RouteKey>, request: RequestBuilder) -> Result<Pending> {
        if request.try_clone().is_none() {
            return Err(SluiceError::UnclonableRequest);
        }

        let factory: RequestFactory = Box::new(move || {
            let builder = request
                .try_clone()
                .expect("clonability was checked at submit time");
            Box::pin(async move { builder.send().await })
        });
        self.submit_boxed(key.into(), factory)
    }

    /// Submit and await in one call.
    pub async fn execute<F, Fut>(&self, key: impl Into<RouteKey>, factory: F) -> Result<String>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RawOutcome> + Send + 'static,
    {
        self.submit(key, factory)?.await
    }

    fn submit_boxed(&self, key: RouteKey, factory: RequestFactory) -> Result<Pending> {
        let (request, pending) = Request::new(factory);
        tracing::debug!(route = %key, id = request.id, "submitting request");

        match self.shared.with_bucket(&key, |bucket| bucket.try_enqueue(request)) {
            Ok(()) => Ok(pending),
            Err(_rejected) => {
                let capacity = self.shared.config.queue_capacity;
                tracing::warn!(route = %key, capacity, "route queue full; rejecting submission");
                Err(SluiceError::Backpressure { key, capacity })
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.shared.config)
            .field("routes", &self.shared.route_count())
            .finish()
    }
}
