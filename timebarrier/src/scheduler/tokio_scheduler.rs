//! Scheduler backed by a tokio runtime.

use super::{Scheduler, TimerCallback, TimerHandle};
use crate::errors::BarrierError;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::trace;

/// Fires timers from tasks spawned on a tokio runtime.
///
/// Each registration spawns one task that sleeps for the delay. Cancelling
/// a pending timer aborts its task. Registering on a runtime that has shut
/// down fails with [`BarrierError::Scheduler`].
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns onto the given runtime.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Creates a scheduler for the runtime the caller is running in.
    pub fn current() -> Result<Self, BarrierError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| BarrierError::scheduler(e.to_string()))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(
        &self,
        callback: TimerCallback,
        delay: Duration,
    ) -> Result<TimerHandle, BarrierError> {
        let handle = TimerHandle::new();
        let timer = handle.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if timer.fire(callback) {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                trace!(timer_id = timer.id(), delay_ms, "Timer fired");
            }
        });

        // A shut-down runtime cancels the task as soon as it is spawned.
        if task.is_finished() && handle.is_pending() {
            handle.cancel();
            return Err(BarrierError::scheduler("tokio runtime has shut down"));
        }
        handle.set_cancel_hook(move || task.abort());

        Ok(handle)
    }
}
