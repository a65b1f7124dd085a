//! # Timebarrier
//!
//! A time-bounded execution barrier for asynchronous pipeline stages.
//!
//! A [`TimeBarrier`](barrier::TimeBarrier) races guarded sections of work
//! against a one-shot timer and routes the result:
//!
//! - **In time**: the section runs inline on the caller's thread
//! - **Too late**: the section is skipped and the downstream stage receives
//!   [`DeadlineExceeded`](errors::DeadlineExceeded)
//! - **Pass-through**: without a scheduler every section runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timebarrier::prelude::*;
//!
//! let scheduler = Arc::new(TokioScheduler::current()?);
//! let barrier = TimeBarrier::new(Some(scheduler), Duration::from_millis(100));
//! barrier.initialize()?;
//!
//! let outcome = barrier.execute(|| fetch(), &downstream)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod barrier;
pub mod core;
pub mod errors;
pub mod observability;
pub mod scheduler;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::barrier::{ArmingPolicy, BarrierConfig, BarrierState, TimeBarrier};
    pub use crate::core::Outcome;
    pub use crate::errors::{BarrierError, DeadlineExceeded, StageError};
    pub use crate::observability::init_logging;
    pub use crate::scheduler::{
        CancelOutcome, Scheduler, TimerCallback, TimerHandle, TokioScheduler,
    };
    pub use crate::stages::{DeferredStage, FnStage, NoOpStage, ReportError, Stage};
}
