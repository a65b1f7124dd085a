//! Success-or-failure result of a unit of work.

use serde::{Deserialize, Serialize};

/// The result of a unit of asynchronous work.
///
/// `Outcome` is immutable once created. The error type comes first so that
/// a barrier can report `Outcome<DeadlineExceeded, R>` for any section
/// result `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<E, T> {
    /// The work completed with a value.
    Success(T),
    /// The work failed with an error.
    Failure(E),
}

impl<E, T> Outcome<E, T> {
    /// Creates a successful outcome.
    #[must_use]
    pub const fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Creates a failed outcome.
    #[must_use]
    pub const fn failure(error: E) -> Self {
        Self::Failure(error)
    }

    /// Returns true if the work succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the work failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrows the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrows the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Converts to an optional value, discarding the error.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Converts to a standard `Result`.
    pub fn into_result(self) -> Result<T, E> {
        self.into()
    }

    /// Transforms the success value.
    pub fn map<U, F>(self, f: F) -> Outcome<E, U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Transforms the error.
    pub fn map_err<G, F>(self, f: F) -> Outcome<G, T>
    where
        F: FnOnce(E) -> G,
    {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(error) => Outcome::Failure(f(error)),
        }
    }
}

impl<E, T> From<Result<T, E>> for Outcome<E, T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<E, T> From<Outcome<E, T>> for Result<T, E> {
    fn from(outcome: Outcome<E, T>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_into_option() {
        let outcome: Outcome<String, i32> = Outcome::success(7);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(outcome.value(), Some(&7));
        assert_eq!(outcome.into_option(), Some(7));
    }

    #[test]
    fn test_failure_into_option() {
        let outcome: Outcome<String, i32> = Outcome::failure("boom".to_string());
        assert!(outcome.is_failure());
        assert_eq!(outcome.error(), Some(&"boom".to_string()));
        assert_eq!(outcome.into_option(), None);
    }

    #[test]
    fn test_map_leaves_failure_untouched() {
        let ok: Outcome<&str, i32> = Outcome::success(2);
        assert_eq!(ok.map(|v| v * 10), Outcome::Success(20));

        let failed: Outcome<&str, i32> = Outcome::failure("nope");
        assert_eq!(failed.map(|v| v * 10), Outcome::Failure("nope"));
    }

    #[test]
    fn test_map_err() {
        let failed: Outcome<&str, i32> = Outcome::failure("nope");
        assert_eq!(failed.map_err(str::len), Outcome::Failure(4));
    }

    #[test]
    fn test_result_conversions() {
        let outcome: Outcome<&str, i32> = Ok(1).into();
        assert_eq!(outcome, Outcome::Success(1));
        assert_eq!(outcome.into_result(), Ok(1));

        let outcome: Outcome<&str, i32> = Err("bad").into();
        let result: Result<i32, &str> = outcome.into();
        assert_eq!(result, Err("bad"));
    }

    #[test]
    fn test_serialization_shape() {
        let outcome: Outcome<String, i32> = Outcome::success(3);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "success": 3 }));

        let back: Outcome<String, i32> =
            serde_json::from_value(serde_json::json!({ "failure": "late" })).unwrap();
        assert_eq!(back, Outcome::Failure("late".to_string()));
    }
}
