//! The result a promise delivers, and the shared slot it is written into.

use crate::Error;
use parking_lot::Mutex;

/// A captured failure, as handed to [`Promise::set_exception`] or returned by
/// a producer.
///
/// [`Promise::set_exception`]: crate::Promise::set_exception
pub type Failure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a promise is fulfilled with: a value or a failure. A unit promise is
/// fulfilled with `Outcome::Value(())`.
#[derive(Debug)]
pub enum Outcome<T> {
    Value(T),
    Failure(Error),
}

impl<T> Outcome<T> {
    /// Wrap any error as a rejected outcome.
    pub fn failure<E: Into<Failure>>(err: E) -> Self {
        Outcome::Failure(Error::Rejected(err.into()))
    }

    /// The outcome an armed promise leaves behind when it is dropped.
    pub fn broken() -> Self {
        Outcome::Failure(Error::BrokenPromise)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_value()
    }

    /// Move the value out, or hand back the captured failure as `Err`.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl Outcome<()> {
    pub fn unit() -> Self {
        Outcome::Value(())
    }
}

impl<T, E: Into<Failure>> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(err) => Outcome::failure(err),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Error> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}

/// Write-once cell shared between a [`Promise`](crate::Promise) and whoever
/// waits on its signal.
#[derive(Debug)]
pub struct Slot<T> {
    outcome: Mutex<Option<Outcome<T>>>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
        }
    }

    /// Store `outcome`. Returns `false` and keeps the first outcome if the
    /// slot was already written.
    pub(crate) fn put(&self, outcome: Outcome<T>) -> bool {
        let mut slot = self.outcome.lock();
        if slot.is_some() {
            tracing::warn!("outcome slot written twice, keeping the first outcome");
            return false;
        }
        *slot = Some(outcome);
        true
    }

    /// Move the outcome out, leaving the slot empty.
    pub fn take(&self) -> Option<Outcome<T>> {
        self.outcome.lock().take()
    }

    pub fn is_filled(&self) -> bool {
        self.outcome.lock().is_some()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}
