//! Maps raw HTTP results onto scheduling outcomes.
//!
//! Classification is the only part of the engine that understands the wire
//! protocol of the wrapped API. The default [`HttpClassifier`] reads limit
//! signaling from `Retry-After` and `X-Rate-Limit-Type` headers; targets
//! with different conventions implement [`Classifier`] themselves and plug
//! it into [`Scheduler::with_classifier`](crate::Scheduler::with_classifier).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::error::SluiceError;
use crate::outcome::{LimitScope, Outcome};

/// Raw result of one invocation of a request factory.
pub type RawOutcome = std::result::Result<Response, reqwest::Error>;

/// Turns the raw result of one attempt into an [`Outcome`].
///
/// Implementations must preserve the global-vs-route scope distinction
/// faithfully: it decides which throttle pauses after a rejection.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, raw: RawOutcome) -> Outcome;
}

/// Server's wait hint on a 429, in whole seconds.
const RETRY_AFTER: &str = "Retry-After";

/// Names the exceeded limit on a 429: "application" and "service" are
/// app-wide, anything else is scoped to the called route.
const LIMIT_TYPE: &str = "X-Rate-Limit-Type";

/// Usage counters the server reports on every response.
const APP_COUNT: &str = "X-App-Rate-Limit-Count";
const ROUTE_COUNT: &str = "X-Method-Rate-Limit-Count";

/// Default classifier for APIs that signal rate limits through headers.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    min_retry_after: Duration,
}

impl HttpClassifier {
    /// `min_retry_after` is both the floor for the server's wait hint and
    /// the fallback when the hint is absent or unparseable.
    pub fn new(min_retry_after: Duration) -> Self {
        Self { min_retry_after }
    }

    fn retry_after(&self, response: &Response) -> Duration {
        header_str(response, RETRY_AFTER)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.min_retry_after)
            .max(self.min_retry_after)
    }

    fn scope(&self, response: &Response) -> LimitScope {
        match header_str(response, LIMIT_TYPE) {
            Some(kind)
                if kind.eq_ignore_ascii_case("application")
                    || kind.eq_ignore_ascii_case("service") =>
            {
                LimitScope::Global
            }
            _ => LimitScope::Route,
        }
    }
}

impl Default for HttpClassifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, raw: RawOutcome) -> Outcome {
        let response = match raw {
            Ok(response) => response,
            Err(err) => {
                return if err.is_timeout() || err.is_connect() || err.is_body() {
                    Outcome::Retryable(SluiceError::Transport(err))
                } else {
                    Outcome::Fatal(SluiceError::Transport(err))
                };
            }
        };

        let status = response.status();
        log_limit_counts(&response);

        if status.is_success() {
            return match response.text().await {
                Ok(body) => Outcome::Success(body),
                // the connection died mid-body; the call itself may be fine
                Err(err) => Outcome::Retryable(SluiceError::Transport(err)),
            };
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Outcome::RateLimited {
                scope: self.scope(&response),
                retry_after: self.retry_after(&response),
            };
        }

        let body = response.text().await.unwrap_or_default();
        Outcome::Fatal(SluiceError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn log_limit_counts(response: &Response) {
    let status = response.status();
    let app_count = header_str(response, APP_COUNT);
    let route_count = header_str(response, ROUTE_COUNT);

    if status.is_success() {
        tracing::debug!(status = %status, app_count, route_count, "response received");
    } else {
        tracing::warn!(status = %status, app_count, route_count, "non-success response");
    }
}
