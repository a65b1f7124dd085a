//! Mock stages for testing.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::stages::ReportError;

/// A stage that records every reported error.
#[derive(Debug)]
pub struct RecordingStage<E> {
    name: String,
    errors: Mutex<Vec<E>>,
}

impl<E> RecordingStage<E> {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Returns the name of the stage.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of errors reported.
    #[must_use]
    pub fn report_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Clears the recorded errors.
    pub fn reset(&self) {
        self.errors.lock().clear();
    }
}

impl<E: Clone> RecordingStage<E> {
    /// Returns the recorded errors in report order.
    #[must_use]
    pub fn errors(&self) -> Vec<E> {
        self.errors.lock().clone()
    }
}

impl<E: Send> ReportError<E> for RecordingStage<E> {
    fn report_error(&self, error: E) {
        self.errors.lock().push(error);
    }
}

/// A guarded section that counts how often it ran.
#[derive(Debug, Default)]
pub struct CountingSection {
    runs: AtomicUsize,
}

impl CountingSection {
    /// Creates a new counting section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one run. Pass `|| section.run()` to the barrier.
    pub fn run(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the number of runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DeadlineExceeded;

    #[test]
    fn test_recording_stage() {
        let stage = RecordingStage::new("downstream");
        assert_eq!(stage.name(), "downstream");
        assert_eq!(stage.report_count(), 0);

        stage.report_error(DeadlineExceeded);
        stage.report_error(DeadlineExceeded);

        assert_eq!(stage.report_count(), 2);
        assert_eq!(stage.errors(), vec![DeadlineExceeded, DeadlineExceeded]);

        stage.reset();
        assert_eq!(stage.report_count(), 0);
    }

    #[test]
    fn test_counting_section() {
        let section = CountingSection::new();
        section.run();
        section.run();
        assert_eq!(section.run_count(), 2);
    }
}
