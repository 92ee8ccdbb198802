use crate::{Baton, Error, Failure, Promise, Signal, Slot};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// What the producer itself raised, as opposed to what it delivered through
/// the promise.
enum Raised {
    Err(Failure),
    Panic(Box<dyn Any + Send + 'static>),
}

/// Hand a fresh [`Promise`] to `producer` and block until it is fulfilled.
///
/// The producer may fulfill the promise right away, keep it, or send it to
/// another thread; the caller stays suspended until the promise is fulfilled
/// or dropped. If the producer returns `Err` or panics, that failure wins
/// over any outcome the promise delivered.
///
/// # Examples
///
/// ```
/// use fiber_promise::{await_promise, Error};
/// use std::thread;
///
/// let value = await_promise(|mut promise| {
///     thread::spawn(move || promise.set_value(String::from("🍓")));
///     Ok::<_, Error>(())
/// });
/// assert_eq!(value.unwrap(), "🍓");
/// ```
pub fn await_promise<T, F, E>(producer: F) -> Result<T, Error>
where
    F: FnOnce(Promise<T, Baton>) -> Result<(), E>,
    E: Into<Failure>,
{
    await_promise_with(Baton::new(), producer)
}

/// Like [`await_promise`], suspending on `signal` instead of a default
/// [`Baton`].
pub fn await_promise_with<T, S, F, E>(signal: S, producer: F) -> Result<T, Error>
where
    S: Signal,
    F: FnOnce(Promise<T, S>) -> Result<(), E>,
    E: Into<Failure>,
{
    let slot = Arc::new(Slot::new());
    let signal = Arc::new(signal);
    let mut raised = None;

    signal.wait(|| {
        let promise = Promise::new(slot.clone(), signal.clone());
        // Still suspend after a failure here: the promise is posted either by
        // whoever holds it now or by its drop.
        raised = match panic::catch_unwind(AssertUnwindSafe(|| producer(promise))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(Raised::Err(err.into())),
            Err(payload) => Some(Raised::Panic(payload)),
        };
    });

    if let Some(raised) = raised {
        if slot.is_filled() {
            tracing::debug!("producer failed, discarding its delivered outcome");
        }
        match raised {
            Raised::Err(err) => return Err(Error::Producer(err)),
            Raised::Panic(payload) => panic::resume_unwind(payload),
        }
    }

    match slot.take() {
        Some(outcome) => outcome.into_result(),
        None => {
            tracing::error!("signal returned before the promise was fulfilled");
            Err(Error::BrokenPromise)
        }
    }
}
