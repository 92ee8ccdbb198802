use crate::{Baton, Error, Failure, Outcome, Signal, Slot};
use std::{fmt, mem, sync::Arc};

/// The exclusive right to fulfill one pending [`Outcome`] exactly once.
///
/// A `Promise` is bound to a [`Slot`] and a [`Signal`] it does not own.
/// Fulfilling it writes the slot and then posts the signal. Dropping it while
/// still armed fulfills it with [`Error::BrokenPromise`], so whoever waits on
/// the signal is always woken.
///
/// Moving the right to fulfill elsewhere is done with [`Promise::take`] (the
/// source is left empty) or [`Promise::swap`]. Any fulfillment attempt on an
/// empty promise returns [`Error::AlreadyFulfilled`].
///
/// # Examples
///
/// ```
/// use fiber_promise::{Baton, Promise, Signal, Slot};
/// use std::sync::Arc;
///
/// let slot = Arc::new(Slot::new());
/// let baton = Arc::new(Baton::new());
/// let mut promise = Promise::new(slot.clone(), baton.clone());
/// promise.set_value("🍓").unwrap();
/// assert!(promise.set_value("🍓").is_err());
///
/// baton.wait(|| {});
/// assert_eq!(slot.take().unwrap().into_result().unwrap(), "🍓");
/// ```
pub struct Promise<T, S: Signal = Baton> {
    state: State<T, S>,
}

enum State<T, S> {
    Armed { slot: Arc<Slot<T>>, signal: Arc<S> },
    Empty,
}

impl<T, S: Signal> Promise<T, S> {
    pub fn new(slot: Arc<Slot<T>>, signal: Arc<S>) -> Self {
        Self {
            state: State::Armed { slot, signal },
        }
    }

    /// A promise that is not bound to anything and can never be fulfilled.
    pub fn empty() -> Self {
        Self { state: State::Empty }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, State::Armed { .. })
    }

    /// Move the right to fulfill out of `self`, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchange states with `other`. Neither side's pending outcome is
    /// abandoned.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.state, &mut other.state);
    }

    pub fn set_value(&mut self, value: T) -> Result<(), Error> {
        self.set_outcome(Outcome::Value(value))
    }

    pub fn set_exception<E: Into<Failure>>(&mut self, err: E) -> Result<(), Error> {
        self.set_outcome(Outcome::failure(err))
    }

    /// Fulfill with whatever `func` returns. `func` is not called if the
    /// promise is already empty.
    pub fn set_with<F, E>(&mut self, func: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<Failure>,
    {
        if !self.is_armed() {
            return Err(Error::AlreadyFulfilled);
        }
        self.set_outcome(func().into())
    }

    pub fn set_outcome(&mut self, outcome: Outcome<T>) -> Result<(), Error> {
        let (slot, signal) = match mem::replace(&mut self.state, State::Empty) {
            State::Armed { slot, signal } => (slot, signal),
            State::Empty => return Err(Error::AlreadyFulfilled),
        };

        let written = slot.put(outcome);
        drop(slot);
        if !written {
            // Another promise over the same slot already delivered and posted.
            return Err(Error::AlreadyFulfilled);
        }
        tracing::trace!("promise fulfilled");

        // Once posted, the waiter may tear down anything it owns, so nothing
        // of this promise is touched past this point.
        signal.post();
        Ok(())
    }
}

impl<S: Signal> Promise<(), S> {
    /// Fulfill a unit promise.
    pub fn complete(&mut self) -> Result<(), Error> {
        self.set_outcome(Outcome::unit())
    }
}

impl<T, S: Signal> Default for Promise<T, S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, S: Signal> Drop for Promise<T, S> {
    /// If this is an unfulfilled promise, wake the waiter with an error.
    fn drop(&mut self) {
        if self.is_armed() {
            tracing::debug!("promise dropped without being fulfilled");
            let _ = self.set_outcome(Outcome::broken());
        }
    }
}

impl<T, S: Signal> fmt::Debug for Promise<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("armed", &self.is_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Promise;
    use crate::{Baton, Error, Signal, Slot};
    use std::{io, sync::Arc, thread};

    fn pair<T>() -> (Arc<Slot<T>>, Arc<Baton>) {
        (Arc::new(Slot::new()), Arc::new(Baton::new()))
    }

    #[test]
    fn test_promise_set_value() {
        let (slot, baton) = pair();
        let mut promise = Promise::new(slot.clone(), baton.clone());
        assert!(promise.is_armed());
        promise.set_value(String::from("🍓")).unwrap();
        assert!(!promise.is_armed());
        assert!(baton.try_wait());
        assert_eq!(slot.take().unwrap().into_result().unwrap(), "🍓");
    }

    #[test]
    fn test_promise_set_twice() {
        let (slot, baton) = pair();
        let mut promise = Promise::new(slot.clone(), baton);
        promise.set_value(1).unwrap();
        assert!(matches!(promise.set_value(2), Err(Error::AlreadyFulfilled)));
        assert!(matches!(
            promise.set_exception(io::Error::new(io::ErrorKind::Other, "late")),
            Err(Error::AlreadyFulfilled)
        ));
        assert_eq!(slot.take().unwrap().into_result().unwrap(), 1);
    }

    #[test]
    fn test_promise_shared_slot_keeps_first() {
        let (slot, baton) = pair();
        let mut first = Promise::new(slot.clone(), baton.clone());
        let mut second = Promise::new(slot.clone(), baton.clone());
        first.set_value("first").unwrap();
        assert!(matches!(second.set_value("second"), Err(Error::AlreadyFulfilled)));
        assert!(!second.is_armed());
        assert_eq!(slot.take().unwrap().into_result().unwrap(), "first");
    }

    #[test]
    fn test_promise_set_exception() {
        let (slot, baton) = pair::<u32>();
        let mut promise = Promise::new(slot.clone(), baton);
        promise
            .set_exception(io::Error::new(io::ErrorKind::Other, "reject!!"))
            .unwrap();
        match slot.take().unwrap().into_result() {
            Err(Error::Rejected(failure)) => assert_eq!(failure.to_string(), "reject!!"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_promise_complete() {
        let (slot, baton) = pair::<()>();
        let mut promise = Promise::new(slot.clone(), baton.clone());
        promise.complete().unwrap();
        assert!(baton.try_wait());
        assert!(slot.take().unwrap().into_result().is_ok());
    }

    #[test]
    fn test_promise_set_with() {
        let (slot, baton) = pair();
        let mut promise = Promise::new(slot.clone(), baton);
        promise.set_with(|| Ok::<_, io::Error>(7)).unwrap();
        assert_eq!(slot.take().unwrap().into_result().unwrap(), 7);

        let mut called = false;
        let result = promise.set_with(|| {
            called = true;
            Ok::<_, io::Error>(8)
        });
        assert!(matches!(result, Err(Error::AlreadyFulfilled)));
        assert!(!called);
    }

    #[test]
    fn test_promise_unfulfilled() {
        let (slot, baton) = pair::<String>();
        let promise = Promise::new(slot.clone(), baton.clone());
        drop(promise);
        assert!(baton.try_wait());
        assert!(matches!(
            slot.take().unwrap().into_result(),
            Err(Error::BrokenPromise)
        ));
    }

    #[test]
    fn test_promise_take() {
        let (slot, baton) = pair();
        let mut first = Promise::new(slot.clone(), baton.clone());
        let mut second = first.take();
        assert!(!first.is_armed());
        assert!(second.is_armed());
        // Dropping the empty source must not break the pair.
        drop(first);
        assert!(!baton.try_wait());

        second.set_value(5).unwrap();
        assert_eq!(slot.take().unwrap().into_result().unwrap(), 5);
    }

    #[test]
    fn test_promise_moved_from_fails() {
        let (slot, baton) = pair();
        let mut first = Promise::new(slot, baton);
        let mut second = std::mem::take(&mut first);
        second.set_value(1).unwrap();
        assert!(matches!(first.set_value(2), Err(Error::AlreadyFulfilled)));
    }

    #[test]
    fn test_promise_swap() {
        let (slot_a, baton_a) = pair();
        let (slot_b, baton_b) = pair();
        let mut a = Promise::new(slot_a.clone(), baton_a.clone());
        let mut b = Promise::new(slot_b.clone(), baton_b.clone());
        a.swap(&mut b);

        a.set_value("to b").unwrap();
        assert!(baton_b.try_wait());
        assert!(!baton_a.try_wait());
        assert_eq!(slot_b.take().unwrap().into_result().unwrap(), "to b");

        drop(b);
        assert!(baton_a.try_wait());
        assert!(matches!(
            slot_a.take().unwrap().into_result(),
            Err(Error::BrokenPromise)
        ));
    }

    #[test]
    fn test_promise_swap_with_empty() {
        let (slot, baton) = pair();
        let mut empty = Promise::<u8>::empty();
        let mut armed = Promise::new(slot.clone(), baton);
        empty.swap(&mut armed);
        assert!(empty.is_armed());
        assert!(!armed.is_armed());
        empty.set_value(9).unwrap();
        assert_eq!(slot.take().unwrap().into_result().unwrap(), 9);
    }

    #[test]
    fn test_promise_fulfilled_on_other_thread() {
        let (slot, baton) = pair();
        let promise = Promise::new(slot.clone(), baton.clone());
        baton.wait(move || {
            let mut promise = promise;
            thread::spawn(move || promise.set_value(42u64));
        });
        assert_eq!(slot.take().unwrap().into_result().unwrap(), 42);
    }
}
