//! Cancellable one-shot timer handle.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

type CancelHook = Box<dyn FnOnce() + Send>;

/// Result of trying to cancel a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The timer was pending and will never fire.
    Cancelled,
    /// The timer fired before the cancellation.
    AlreadyFired,
    /// The timer was cancelled earlier.
    AlreadyCancelled,
}

impl std::fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::AlreadyFired => write!(f, "already_fired"),
            Self::AlreadyCancelled => write!(f, "already_cancelled"),
        }
    }
}

struct HandleInner {
    id: u64,
    state: AtomicU8,
    on_cancel: Mutex<Option<CancelHook>>,
}

/// A handle to a one-shot delayed callback.
///
/// The handle moves from pending to either fired or cancelled exactly once.
/// Firing and cancelling race through a single compare-and-swap, so a
/// callback never runs after a successful cancel and never runs twice.
/// Clones share the same timer.
#[derive(Clone)]
pub struct TimerHandle {
    inner: Arc<HandleInner>,
}

impl TimerHandle {
    /// Creates a new pending handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
                state: AtomicU8::new(PENDING),
                on_cancel: Mutex::new(None),
            }),
        }
    }

    /// Returns the process-unique id of this timer.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Attempts to cancel the timer.
    ///
    /// Safe to call any number of times and after firing.
    pub fn cancel(&self) -> CancelOutcome {
        match self.inner.state.compare_exchange(
            PENDING,
            CANCELLED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                let hook = self.inner.on_cancel.lock().take();
                if let Some(hook) = hook {
                    hook();
                }
                CancelOutcome::Cancelled
            }
            Err(FIRED) => CancelOutcome::AlreadyFired,
            Err(_) => CancelOutcome::AlreadyCancelled,
        }
    }

    /// Runs `callback` if this call wins the transition to fired.
    ///
    /// Scheduler implementations call this when the delay elapses. Returns
    /// true if the callback ran.
    pub fn fire<F>(&self, callback: F) -> bool
    where
        F: FnOnce(),
    {
        if self
            .inner
            .state
            .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        drop(self.inner.on_cancel.lock().take());
        callback();
        true
    }

    /// Registers cleanup to run if the timer is cancelled while pending.
    ///
    /// Runs immediately if the timer was already cancelled, and is dropped
    /// if it already fired.
    pub fn set_cancel_hook<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut slot = self.inner.on_cancel.lock();
            if self.is_pending() {
                *slot = Some(Box::new(hook));
                return;
            }
        }
        if self.is_cancelled() {
            hook();
        }
    }

    /// Returns true if the timer has neither fired nor been cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == PENDING
    }

    /// Returns true if the timer fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == FIRED
    }

    /// Returns true if the timer was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == CANCELLED
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.state.load(Ordering::Acquire) {
            PENDING => "pending",
            FIRED => "fired",
            _ => "cancelled",
        };
        f.debug_struct("TimerHandle")
            .field("id", &self.id())
            .field("state", &state)
            .finish()
    }
}
