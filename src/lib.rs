//! Sluice - a client-side scheduler for rate-limited HTTP APIs
//!
//! Sluice queues prepared HTTP calls behind two layers of rate limiting —
//! a shared global limit and independent per-route limits — and absorbs
//! 429 rejections and transient transport faults by pausing and
//! resubmitting, so callers only ever see a final response body or one
//! terminal error.
//!
//! ```ignore
//! use sluice::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let client = reqwest::Client::new();
//! let body = scheduler
//!     .execute("match-v1", move || {
//!         client.get("https://api.example.com/matches/recent").send()
//!     })
//!     .await?;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod outcome;
pub mod scheduler;

pub use classify::{Classifier, HttpClassifier, RawOutcome};
pub use config::SchedulerConfig;
pub use error::{Result, SluiceError};
pub use outcome::{LimitScope, Outcome};
pub use scheduler::{Pending, RouteKey, Scheduler};
