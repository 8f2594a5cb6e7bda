//! Classified result of one call attempt.

use std::time::Duration;

use crate::error::SluiceError;

/// Which throttle a rate-limit rejection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    /// Counts against the shared application-wide limit; every route pauses.
    Global,
    /// Counts against one route's limit; only that route pauses.
    Route,
}

/// What the scheduler should do with the result of a single attempt.
///
/// Produced once per attempt by a [`Classifier`](crate::classify::Classifier)
/// and never stored.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx response; carries the raw body.
    Success(String),
    /// The server rejected the call for exceeding a limit. Pause the
    /// indicated scope for at least `retry_after`, then resubmit.
    RateLimited {
        scope: LimitScope,
        retry_after: Duration,
    },
    /// Transient fault worth retrying with backoff.
    Retryable(SluiceError),
    /// Unrecoverable; fails the caller's request as-is.
    Fatal(SluiceError),
}
