//! Request scheduling against layered rate limits.
//!
//! This module provides:
//! - **Scheduler**: the single entry point; wraps calls into queued requests
//!   and lazily creates one bucket per route key.
//! - **Buckets**: per-route FIFO queues, each drained by one worker task so
//!   a route never has more than one call in flight.
//! - **Pause gates**: extend-only deadlines implementing route-scope pauses
//!   and the shared global throttle.
//! - **Attempt driver**: the classify-and-retry state machine run for every
//!   admission.
//!
//! # Architecture
//!
//! A submission becomes an internal request value holding the caller's
//! reply slot, and enters its route's queue. The bucket worker admits it
//! once both pause gates are clear, fires the call, and classifies the
//! result. Rate-limited and transient outcomes re-enter the queue from the
//! back after their delay (on a detached task, so the worker moves on);
//! success and fatal outcomes settle the caller's [`Pending`].

mod attempt;
mod bucket;
mod gate;
mod manager;
mod request;

pub use manager::Scheduler;
pub use request::{Pending, RouteKey};
