//! Testing utilities for barrier users.
//!
//! This module provides:
//! - A deterministic scheduler driven by a virtual clock
//! - Recording stages and counting sections
//! - Assertions for barrier outcomes

mod assertions;
mod mocks;
mod scheduler;

pub use assertions::{assert_exclusive, assert_section_abandoned, assert_section_ran};
pub use mocks::{CountingSection, RecordingStage};
pub use scheduler::ManualScheduler;
