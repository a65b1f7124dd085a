//! Scheduler contract consumed by the barrier.
//!
//! This module provides:
//! - Scheduler, the one-shot delayed callback service
//! - TimerHandle for best-effort cancellation
//! - TokioScheduler, backed by a tokio runtime

mod handle;
mod tokio_scheduler;

pub use handle::{CancelOutcome, TimerHandle};
pub use tokio_scheduler::TokioScheduler;

use crate::errors::BarrierError;
use std::fmt::Debug;
use std::time::Duration;

/// Callback invoked when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// A service that fires a callback once after a delay.
///
/// Implementations must fire each registration at most once, never earlier
/// than `delay`, and accept a zero delay (fire as soon as practical). The
/// returned handle may be cancelled from any thread, racing the firing.
pub trait Scheduler: Send + Sync + Debug {
    /// Arranges for `callback` to run once after `delay`.
    fn schedule_once(
        &self,
        callback: TimerCallback,
        delay: Duration,
    ) -> Result<TimerHandle, BarrierError>;
}
