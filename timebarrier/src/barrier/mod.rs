//! Time-bounded execution barrier.
//!
//! A [`TimeBarrier`] races guarded sections of work against a one-shot
//! timer. The timer callback only raises a flag; the thread calling
//! [`TimeBarrier::execute`] observes the flag and either runs the section
//! or tells the downstream stage that the deadline was missed. The flag is
//! the only state shared with the timer context.

mod config;

pub use config::{ArmingPolicy, BarrierConfig};

use crate::core::Outcome;
use crate::errors::{BarrierError, DeadlineExceeded};
use crate::observability::SpanTimer;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::stages::ReportError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Low bit of the state word: the armed timer has fired.
const TIMED_OUT: u64 = 1;

/// Observable state of a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierState {
    /// No scheduler; every section runs.
    PassThrough,
    /// `initialize()` has not armed a timer yet.
    Unarmed,
    /// Timer pending or already consumed; the next section runs.
    Armed,
    /// The timer fired; the next section is abandoned.
    Expired,
}

impl std::fmt::Display for BarrierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PassThrough => write!(f, "pass_through"),
            Self::Unarmed => write!(f, "unarmed"),
            Self::Armed => write!(f, "armed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Gates sections of work behind a deadline.
///
/// Lifecycle: construct with a scheduler and timeout, call
/// [`initialize`](Self::initialize) once, then call
/// [`execute`](Self::execute) any number of times. Without a scheduler the
/// barrier is a pass-through and never reports a timeout.
///
/// The shared state is one atomic word: the low bit is the timed-out flag
/// and the remaining bits are the arming epoch. A timer callback only sets
/// the flag for the epoch it was armed in, so under
/// [`ArmingPolicy::Rearm`] a late timer from an earlier deadline cannot
/// expire a later one.
pub struct TimeBarrier {
    scheduler: Option<Arc<dyn Scheduler>>,
    timeout: Duration,
    arming: ArmingPolicy,
    state: Arc<AtomicU64>,
    pending: Mutex<Option<TimerHandle>>,
}

impl TimeBarrier {
    /// Creates a barrier. `None` disables all timing behavior.
    #[must_use]
    pub fn new(scheduler: Option<Arc<dyn Scheduler>>, timeout: Duration) -> Self {
        Self {
            scheduler,
            timeout,
            arming: ArmingPolicy::Once,
            state: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Creates a pass-through barrier that runs every section.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    /// Creates a barrier from configuration.
    ///
    /// A disabled configuration ignores the scheduler.
    #[must_use]
    pub fn from_config(config: &BarrierConfig, scheduler: Option<Arc<dyn Scheduler>>) -> Self {
        let scheduler = scheduler.filter(|_| config.enabled);
        Self::new(scheduler, config.timeout()).with_arming(config.arming)
    }

    /// Sets the arming policy.
    #[must_use]
    pub fn with_arming(mut self, arming: ArmingPolicy) -> Self {
        self.arming = arming;
        self
    }

    /// Returns the configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the arming policy.
    #[must_use]
    pub fn arming(&self) -> ArmingPolicy {
        self.arming
    }

    /// Returns true if a scheduler is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Returns true if the armed timer has fired and no `execute()` has
    /// consumed it yet.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.state.load(Ordering::Acquire) & TIMED_OUT != 0
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> BarrierState {
        if self.scheduler.is_none() {
            BarrierState::PassThrough
        } else if self.pending.lock().is_none() {
            BarrierState::Unarmed
        } else if self.is_timed_out() {
            BarrierState::Expired
        } else {
            BarrierState::Armed
        }
    }

    /// Arms the timer.
    ///
    /// No-op for a pass-through barrier. Fails with
    /// [`BarrierError::AlreadyInitialized`] if called twice.
    pub fn initialize(&self) -> Result<(), BarrierError> {
        let Some(scheduler) = &self.scheduler else {
            debug!("Barrier has no scheduler, running in pass-through mode");
            return Ok(());
        };

        let mut pending = self.pending.lock();
        if pending.is_some() {
            return Err(BarrierError::AlreadyInitialized);
        }
        let epoch = self.state.load(Ordering::Acquire) >> 1;
        *pending = Some(self.arm(scheduler.as_ref(), epoch)?);
        Ok(())
    }

    /// Runs `section` unless the deadline already passed.
    ///
    /// On a missed deadline the section is not called; `stage` receives
    /// [`DeadlineExceeded`] exactly once and the result is
    /// `Outcome::Failure`. Either way the timed-out flag is cleared before
    /// returning. Fails with [`BarrierError::NotInitialized`] if a timed
    /// barrier was never initialized, in which case nothing runs.
    pub fn execute<R, E, S, F>(
        &self,
        section: F,
        stage: &S,
    ) -> Result<Outcome<DeadlineExceeded, R>, BarrierError>
    where
        F: FnOnce() -> R,
        S: ReportError<E> + ?Sized,
        E: From<DeadlineExceeded>,
    {
        if self.scheduler.is_none() {
            return Ok(Outcome::Success(section()));
        }

        let mut guard = self.enter()?;
        if guard.expired {
            self.abandon::<E, S>(stage);
            return Ok(Outcome::Failure(DeadlineExceeded));
        }

        guard.ran = true;
        let timer = SpanTimer::start("guarded_section");
        let value = section();
        debug!(duration_ms = timer.finish(), "Guarded section completed");
        Ok(Outcome::Success(value))
    }

    /// Async variant of [`execute`](Self::execute).
    ///
    /// The deadline is checked before the section's future is created; on a
    /// missed deadline the future is never started. Dropping the returned
    /// future mid-section still clears the flag.
    pub async fn execute_async<R, E, S, F, Fut>(
        &self,
        section: F,
        stage: &S,
    ) -> Result<Outcome<DeadlineExceeded, R>, BarrierError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        S: ReportError<E> + ?Sized,
        E: From<DeadlineExceeded>,
    {
        if self.scheduler.is_none() {
            return Ok(Outcome::Success(section().await));
        }

        let mut guard = self.enter()?;
        if guard.expired {
            self.abandon::<E, S>(stage);
            return Ok(Outcome::Failure(DeadlineExceeded));
        }

        guard.ran = true;
        let timer = SpanTimer::start("guarded_section");
        let value = section().await;
        debug!(duration_ms = timer.finish(), "Guarded section completed");
        Ok(Outcome::Success(value))
    }

    fn enter(&self) -> Result<SettleGuard<'_>, BarrierError> {
        let timer = self
            .pending
            .lock()
            .clone()
            .ok_or(BarrierError::NotInitialized)?;
        let expired = self.is_timed_out();
        Ok(SettleGuard {
            barrier: self,
            timer,
            expired,
            ran: false,
        })
    }

    fn abandon<E, S>(&self, stage: &S)
    where
        S: ReportError<E> + ?Sized,
        E: From<DeadlineExceeded>,
    {
        warn!(
            timeout_ms = self.timeout_ms(),
            "Deadline exceeded, abandoning guarded section"
        );
        stage.report_error(E::from(DeadlineExceeded));
    }

    fn arm(&self, scheduler: &dyn Scheduler, epoch: u64) -> Result<TimerHandle, BarrierError> {
        let state = Arc::clone(&self.state);
        let armed = epoch << 1;
        let handle = scheduler.schedule_once(
            Box::new(move || {
                if state
                    .compare_exchange(armed, armed | TIMED_OUT, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    trace!(epoch, "Barrier deadline reached");
                }
            }),
            self.timeout,
        )?;
        debug!(
            timer_id = handle.id(),
            epoch,
            timeout_ms = self.timeout_ms(),
            "Barrier armed"
        );
        Ok(handle)
    }

    /// Cancels the timer if needed, clears the flag and re-arms under
    /// [`ArmingPolicy::Rearm`].
    fn settle(&self, timer: &TimerHandle, ran: bool) {
        if ran || self.arming == ArmingPolicy::Rearm {
            let outcome = timer.cancel();
            debug!(timer_id = timer.id(), %outcome, "Barrier timer cancel attempted");
        }

        match self.arming {
            ArmingPolicy::Once => {
                let previous = self.state.fetch_and(!TIMED_OUT, Ordering::AcqRel);
                if ran && previous & TIMED_OUT != 0 {
                    debug!("Deadline fired while the section was running; result kept");
                }
            }
            ArmingPolicy::Rearm => {
                let Some(scheduler) = &self.scheduler else {
                    return;
                };
                // Bump the epoch and clear the flag in one step.
                let previous = self
                    .state
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                        Some(((s >> 1) + 1) << 1)
                    })
                    .unwrap_or_else(|s| s);
                let next = (previous >> 1) + 1;

                let mut pending = self.pending.lock();
                // A nested or concurrent call may have re-armed already.
                if let Some(stale) = pending.take() {
                    stale.cancel();
                }
                match self.arm(scheduler.as_ref(), next) {
                    Ok(handle) => *pending = Some(handle),
                    Err(e) => error!(error = %e, "Failed to re-arm barrier timer"),
                }
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Drop for TimeBarrier {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().take() {
            timer.cancel();
        }
    }
}

impl std::fmt::Debug for TimeBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeBarrier")
            .field("state", &self.state())
            .field("timeout", &self.timeout)
            .field("arming", &self.arming)
            .finish()
    }
}

/// Settles one `execute()` call on every exit path, including unwinding.
struct SettleGuard<'a> {
    barrier: &'a TimeBarrier,
    timer: TimerHandle,
    expired: bool,
    ran: bool,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.barrier.settle(&self.timer, self.ran);
    }
}
