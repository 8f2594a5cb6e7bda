//! The per-attempt retry state machine.
//!
//! One call of [`run_attempt`] covers one admission of one request: invoke
//! the factory, classify the result, then settle, reschedule, or fail.
//! Admission is consumed the moment the factory fires, so a rescheduled
//! attempt re-enters its queue from the back and earns admission again.
//! Rescheduling always happens on a detached task — a sleeping retry never
//! occupies its bucket.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use super::gate::PauseGate;
use super::manager::Shared;
use super::request::{Request, RouteKey};
use crate::error::SluiceError;
use crate::outcome::{LimitScope, Outcome};

pub(crate) async fn run_attempt(
    mut request: Request,
    key: &RouteKey,
    bucket_gate: &PauseGate,
    shared: &Arc<Shared>,
) {
    // Waiting -> Executing: from here on the ticket is spent.
    let raw = request.invoke().await;
    let outcome = shared.classifier.classify(raw).await;

    match outcome {
        Outcome::Success(body) => {
            tracing::debug!(route = %key, id = request.id, "request settled");
            request.settle(Ok(body));
        }
        Outcome::RateLimited { scope, retry_after } => {
            match scope {
                LimitScope::Global => {
                    tracing::warn!(
                        route = %key,
                        retry_after_secs = retry_after.as_secs(),
                        "hit global rate limit; pausing every route"
                    );
                    shared.global.pause_for(retry_after);
                }
                LimitScope::Route => {
                    tracing::warn!(
                        route = %key,
                        retry_after_secs = retry_after.as_secs(),
                        "hit route rate limit; pausing this route"
                    );
                    bucket_gate.pause_for(retry_after);
                }
            }
            resubmit_after(shared, key.clone(), request, retry_after);
        }
        Outcome::Retryable(cause) => {
            request.attempts += 1;
            if request.attempts > shared.config.max_retries {
                let attempts = request.attempts - 1;
                tracing::error!(route = %key, id = request.id, attempts, "retries exhausted");
                request.settle(Err(SluiceError::RetriesExhausted {
                    attempts,
                    source: Box::new(cause),
                }));
            } else {
                let delay = backoff_delay(request.attempts);
                tracing::warn!(
                    route = %key,
                    id = request.id,
                    attempt = request.attempts,
                    delay_secs = delay.as_secs(),
                    error = %cause,
                    "transient fault; backing off"
                );
                resubmit_after(shared, key.clone(), request, delay);
            }
        }
        Outcome::Fatal(cause) => {
            tracing::error!(route = %key, id = request.id, error = %cause, "request failed");
            request.settle(Err(cause));
        }
    }
}

/// Re-enter the queue from the back once `delay` has elapsed.
fn resubmit_after(shared: &Arc<Shared>, key: RouteKey, request: Request, delay: Duration) {
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        time::sleep(delay).await;
        shared.resubmit(key, request).await;
    });
}

/// Quadratic backoff, zero-based: the n-th retry waits `(n-1)²` seconds, so
/// the first retry goes out immediately.
fn backoff_delay(attempt: u32) -> Duration {
    let steps = u64::from(attempt.saturating_sub(1));
    Duration::from_secs(steps * steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_retry_is_immediate() {
        assert_eq!(backoff_delay(1), Duration::ZERO);
    }

    #[test]
    fn test_backoff_grows_quadratically() {
        assert_eq!(backoff_delay(2), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(4), Duration::from_secs(9));
        assert_eq!(backoff_delay(10), Duration::from_secs(81));
    }
}
