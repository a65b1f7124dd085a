//! Core domain model types for timebarrier.
//!
//! This module contains the result type shared by stages and the barrier.

mod outcome;

pub use outcome::Outcome;
