//! Test assertions for barrier outcomes.

use crate::core::Outcome;
use crate::errors::DeadlineExceeded;

/// Asserts that the guarded section ran.
pub fn assert_section_ran<R: std::fmt::Debug>(outcome: &Outcome<DeadlineExceeded, R>) {
    assert!(
        outcome.is_success(),
        "Expected the section to run, got: {:?}",
        outcome
    );
}

/// Asserts that the guarded section was abandoned on a missed deadline.
pub fn assert_section_abandoned<R: std::fmt::Debug>(outcome: &Outcome<DeadlineExceeded, R>) {
    assert!(
        matches!(outcome, Outcome::Failure(DeadlineExceeded)),
        "Expected the section to be abandoned, got: {:?}",
        outcome
    );
}

/// Asserts that exactly one of the two barrier outcomes happened.
pub fn assert_exclusive(section_runs: usize, reports: usize) {
    assert_eq!(
        section_runs + reports,
        1,
        "Expected exactly one of section run / error report, got {} runs and {} reports",
        section_runs,
        reports
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_section_ran() {
        assert_section_ran(&Outcome::<DeadlineExceeded, i32>::Success(1));
    }

    #[test]
    #[should_panic(expected = "Expected the section to run")]
    fn test_assert_section_ran_panics() {
        assert_section_ran(&Outcome::<DeadlineExceeded, ()>::Failure(DeadlineExceeded));
    }

    #[test]
    fn test_assert_section_abandoned() {
        assert_section_abandoned(&Outcome::<DeadlineExceeded, ()>::Failure(DeadlineExceeded));
    }

    #[test]
    #[should_panic(expected = "exactly one")]
    fn test_assert_exclusive_rejects_both() {
        assert_exclusive(1, 1);
    }
}
