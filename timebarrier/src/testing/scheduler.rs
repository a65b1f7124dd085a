//! Deterministic scheduler for tests.

use parking_lot::Mutex;
use std::time::Duration;

use crate::errors::BarrierError;
use crate::scheduler::{Scheduler, TimerCallback, TimerHandle};

struct ScheduledTimer {
    due: Duration,
    seq: u64,
    handle: TimerHandle,
    callback: TimerCallback,
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_seq: u64,
    timers: Vec<ScheduledTimer>,
}

/// A scheduler driven by a virtual clock.
///
/// Timers only fire when the test calls [`ManualScheduler::advance`] or
/// [`ManualScheduler::fire_all`], on the calling thread, in deadline order.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<VirtualClock>,
    registrations: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    /// Creates a new manual scheduler at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Advances the clock and fires every timer that became due.
    ///
    /// Returns the number of callbacks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut clock = self.clock.lock();
            clock.now += by;
            let now = clock.now;
            let (due, rest): (Vec<_>, Vec<_>) =
                clock.timers.drain(..).partition(|t| t.due <= now);
            clock.timers = rest;
            due
        };
        Self::fire(due)
    }

    /// Fires every registered timer regardless of its deadline.
    pub fn fire_all(&self) -> usize {
        let due = std::mem::take(&mut self.clock.lock().timers);
        Self::fire(due)
    }

    fn fire(mut due: Vec<ScheduledTimer>) -> usize {
        due.sort_by_key(|t| (t.due, t.seq));
        // Lock is released so callbacks may schedule new timers.
        due.into_iter()
            .filter(|t| t.handle.is_pending())
            .map(|t| t.handle.fire(t.callback))
            .filter(|fired| *fired)
            .count()
    }

    /// Returns the number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.clock
            .lock()
            .timers
            .iter()
            .filter(|t| t.handle.is_pending())
            .count()
    }

    /// Returns the delay of every registration, in order.
    #[must_use]
    pub fn registrations(&self) -> Vec<Duration> {
        self.registrations.lock().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(
        &self,
        callback: TimerCallback,
        delay: Duration,
    ) -> Result<TimerHandle, BarrierError> {
        let handle = TimerHandle::new();
        {
            let mut clock = self.clock.lock();
            clock.timers.retain(|t| t.handle.is_pending());
            let seq = clock.next_seq;
            clock.next_seq += 1;
            let due = clock.now + delay;
            clock.timers.push(ScheduledTimer {
                due,
                seq,
                handle: handle.clone(),
                callback,
            });
        }
        self.registrations.lock().push(delay);
        Ok(handle)
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending_count", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn push_callback(order: &Arc<Mutex<Vec<u32>>>, tag: u32) -> TimerCallback {
        let order = order.clone();
        Box::new(move || order.lock().push(tag))
    }

    #[test]
    fn test_advance_fires_due_timers_in_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        scheduler
            .schedule_once(push_callback(&order, 2), Duration::from_millis(20))
            .unwrap();
        scheduler
            .schedule_once(push_callback(&order, 1), Duration::from_millis(10))
            .unwrap();
        scheduler
            .schedule_once(push_callback(&order, 3), Duration::from_millis(30))
            .unwrap();

        assert_eq!(scheduler.advance(Duration::from_millis(25)), 2);
        assert_eq!(*order.lock(), vec![1, 2]);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.now(), Duration::from_millis(25));

        assert_eq!(scheduler.advance(Duration::from_millis(5)), 1);
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancelled_timer_is_skipped() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let handle = scheduler
            .schedule_once(
                Box::new(move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                }),
                Duration::from_millis(1),
            )
            .unwrap();
        handle.cancel();

        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.fire_all(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_delay_is_due_immediately() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let handle = scheduler
            .schedule_once(push_callback(&order, 7), Duration::ZERO)
            .unwrap();

        assert_eq!(scheduler.advance(Duration::ZERO), 1);
        assert!(handle.is_fired());
        assert_eq!(scheduler.registrations(), vec![Duration::ZERO]);
    }

    #[test]
    fn test_cancelled_timers_pruned_on_schedule() {
        let scheduler = ManualScheduler::new();
        for _ in 0..50 {
            let handle = scheduler
                .schedule_once(Box::new(|| {}), Duration::from_secs(60))
                .unwrap();
            handle.cancel();
        }
        scheduler
            .schedule_once(Box::new(|| {}), Duration::from_secs(60))
            .unwrap();

        assert_eq!(scheduler.clock.lock().timers.len(), 2);
        assert_eq!(scheduler.pending_count(), 1);
    }
}
