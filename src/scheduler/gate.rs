//! Extend-only pause deadlines.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// A pause deadline that only moves forward in time.
///
/// One instance is the scheduler-wide throttle; each bucket owns another.
/// Workers consult both before admitting a request. Re-arming with an
/// earlier deadline is a no-op: a later rate-limit signal can extend a
/// pause but never shorten one.
#[derive(Debug, Default)]
pub(crate) struct PauseGate {
    until: Mutex<Option<Instant>>,
}

impl PauseGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Extend the pause to `now + wait` unless the current deadline is later.
    pub(crate) fn pause_for(&self, wait: Duration) {
        let candidate = Instant::now() + wait;
        let mut until = self.until.lock().unwrap();
        match *until {
            Some(current) if current >= candidate => {}
            _ => {
                tracing::debug!(pause_secs = wait.as_secs(), "pause deadline extended");
                *until = Some(candidate);
            }
        }
    }

    /// The active deadline, if it still lies in the future.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        let until = self.until.lock().unwrap();
        (*until).filter(|deadline| *deadline > Instant::now())
    }
}
