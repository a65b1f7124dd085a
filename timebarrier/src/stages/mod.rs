//! Stage traits and implementations.
//!
//! A stage is the next step of a pipeline. The barrier only needs one
//! capability from it, [`ReportError`], which tells the stage it will never
//! receive a normal result.

use crate::core::Outcome;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Capability to be told, out of band, that an error occurred.
///
/// Implementations may be called from any thread and must not block
/// indefinitely.
pub trait ReportError<E>: Send + Sync {
    /// Reports an error instead of a normal result.
    fn report_error(&self, error: E);
}

impl<E, S> ReportError<E> for &S
where
    S: ReportError<E> + ?Sized,
{
    fn report_error(&self, error: E) {
        (**self).report_error(error);
    }
}

impl<E, S> ReportError<E> for Arc<S>
where
    S: ReportError<E> + ?Sized,
{
    fn report_error(&self, error: E) {
        (**self).report_error(error);
    }
}

/// Trait for pipeline stages.
///
/// A stage receives either a normal input through [`Stage::complete`] or an
/// error through [`ReportError::report_error`].
pub trait Stage<I, O, E>: ReportError<E> {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Feeds a normal upstream result into the stage.
    fn complete(&self, input: I);

    /// Returns the outcome if the stage has settled.
    fn outcome(&self) -> Option<Outcome<E, O>>;
}

type Transform<I, O, E> = Box<dyn Fn(I) -> Result<O, E> + Send + Sync>;

/// A continuation that settles at most once.
///
/// The first of [`Stage::complete`] and [`ReportError::report_error`] wins;
/// later calls are ignored.
pub struct DeferredStage<I, O, E> {
    name: String,
    transform: Transform<I, O, E>,
    slot: Mutex<Option<Outcome<E, O>>>,
    settled: Notify,
    _input: PhantomData<fn(I)>,
}

impl<I, O, E> DeferredStage<I, O, E> {
    /// Creates a new deferred stage from a transform.
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Box::new(transform),
            slot: Mutex::new(None),
            settled: Notify::new(),
            _input: PhantomData,
        }
    }

    /// Returns true once the stage received a result or an error.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn settle(&self, outcome: Outcome<E, O>) -> bool {
        {
            let mut slot = self.slot.lock();
            if slot.is_some() {
                debug!(stage = %self.name, "Stage already settled, ignoring");
                return false;
            }
            *slot = Some(outcome);
        }
        self.settled.notify_waiters();
        true
    }
}

impl<I, O, E> DeferredStage<I, O, E>
where
    O: Clone,
    E: Clone,
{
    /// Waits until the stage settles and returns its outcome.
    pub async fn wait(&self) -> Outcome<E, O> {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let current = self.slot.lock().clone();
            if let Some(outcome) = current {
                return outcome;
            }
            notified.await;
        }
    }
}

impl<I, O, E> Debug for DeferredStage<I, O, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredStage")
            .field("name", &self.name)
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

impl<I, O, E> ReportError<E> for DeferredStage<I, O, E>
where
    O: Send,
    E: Send,
{
    fn report_error(&self, error: E) {
        if self.settle(Outcome::Failure(error)) {
            debug!(stage = %self.name, "Stage received error");
        }
    }
}

impl<I, O, E> Stage<I, O, E> for DeferredStage<I, O, E>
where
    O: Clone + Send,
    E: Clone + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(&self, input: I) {
        if self.is_settled() {
            debug!(stage = %self.name, "Stage already settled, dropping input");
            return;
        }
        let outcome = Outcome::from((self.transform)(input));
        self.settle(outcome);
    }

    fn outcome(&self) -> Option<Outcome<E, O>> {
        self.slot.lock().clone()
    }
}

/// An error sink backed by a closure.
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F> {
    /// Creates a new function-based error sink.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// Returns the name of the stage.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F> Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .finish()
    }
}

impl<E, F> ReportError<E> for FnStage<F>
where
    F: Fn(E) + Send + Sync,
{
    fn report_error(&self, error: E) {
        (self.func)(error);
    }
}

/// A stage that discards every error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStage;

impl<E> ReportError<E> for NoOpStage {
    fn report_error(&self, _error: E) {}
}
