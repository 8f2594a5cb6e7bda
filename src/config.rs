//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound on each route's pending queue.
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default number of transient faults tolerated per logical request.
const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default wait applied when a 429 carries no usable Retry-After hint.
const DEFAULT_MIN_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Tunables for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How many requests one route's queue may hold. Submissions beyond this
    /// fail immediately with a backpressure error instead of blocking.
    pub queue_capacity: usize,
    /// Transient faults tolerated for one logical request, counted across
    /// every resubmission, before the request fails.
    pub max_retries: u32,
    /// Floor for the server's Retry-After hint; also used when the hint is
    /// absent or unparseable.
    pub min_retry_after: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
            min_retry_after: DEFAULT_MIN_RETRY_AFTER,
        }
    }
}

impl SchedulerConfig {
    /// Create a config with a custom queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Create a config with a custom retry bound.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Create a config with a custom minimum rate-limit wait.
    pub fn with_min_retry_after(mut self, wait: Duration) -> Self {
        self.min_retry_after = wait;
        self
    }
}
