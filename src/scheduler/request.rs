//! Request identity and result plumbing.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::classify::RawOutcome;
use crate::error::{Result, SluiceError};

/// Identifies an endpoint category for rate-limiting purposes.
///
/// Keys are opaque to the scheduler: requests sharing a key share one FIFO
/// queue and one route-scope pause deadline, and that is all a key means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RouteKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RouteKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Re-invocable producer of one call attempt.
pub(crate) type RequestFactory = Box<dyn Fn() -> BoxFuture<'static, RawOutcome> + Send + Sync>;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// One logical request: a factory plus the caller's reply slot.
///
/// The same value survives every resubmission — same id, same reply slot,
/// same retry counter. Settling consumes it, which makes exactly-once
/// delivery structural rather than something to check for.
pub(crate) struct Request {
    pub(crate) id: u64,
    factory: RequestFactory,
    reply: oneshot::Sender<Result<String>>,
    /// Transient-fault count across all resubmissions of this request.
    pub(crate) attempts: u32,
}

impl Request {
    pub(crate) fn new(factory: RequestFactory) -> (Self, Pending) {
        let (reply, rx) = oneshot::channel();
        let request = Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            factory,
            reply,
            attempts: 0,
        };
        (request, Pending { rx })
    }

    /// Fire one attempt. Admission must already be held.
    pub(crate) fn invoke(&self) -> BoxFuture<'static, RawOutcome> {
        (self.factory)()
    }

    /// Deliver the terminal result. A caller that dropped its [`Pending`]
    /// just discards it; the retry chain has already drained by now.
    pub(crate) fn settle(self, result: Result<String>) {
        if self.reply.send(result).is_err() {
            tracing::debug!(id = self.id, "caller went away; discarding result");
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

/// Caller-side handle that resolves to the raw response body.
///
/// Dropping it abandons interest in the result without aborting work the
/// scheduler already started.
pub struct Pending {
    rx: oneshot::Receiver<Result<String>>,
}

impl Future for Pending {
    type Output = Result<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|settled| match settled {
            Ok(result) => result,
            Err(_) => Err(SluiceError::Abandoned),
        })
    }
}
