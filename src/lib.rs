//! A single-fulfillment promise and the `await` adapter that suspends on it.
//!
//! A [`Promise`] is the one-shot right to deliver an [`Outcome`] to a context
//! waiting on a [`Signal`]. [`await_promise`] pairs a fresh slot and signal,
//! hands the promise to producer code, and returns whatever the promise was
//! fulfilled with once the signal fires. A promise dropped without being
//! fulfilled delivers [`Error::BrokenPromise`], so the waiter never hangs.
//!
//! # Examples
//!
//! ```
//! use fiber_promise::{await_promise, Error};
//! use std::thread;
//!
//! let answer = await_promise(|mut promise| {
//!     thread::spawn(move || promise.set_value(42));
//!     Ok::<_, Error>(())
//! });
//! assert_eq!(answer.unwrap(), 42);
//!
//! let broken = await_promise::<u8, _, Error>(|_promise| Ok(()));
//! assert!(matches!(broken, Err(Error::BrokenPromise)));
//! ```
use thiserror::Error;

mod await_promise;
pub mod outcome;
mod promise;
pub mod signal;

pub use await_promise::{await_promise, await_promise_with};
pub use outcome::{Failure, Outcome, Slot};
pub use promise::Promise;
pub use signal::{Baton, BatonOptions, Signal};

#[derive(Debug, Error)]
pub enum Error {
    /// The promise was already fulfilled, or its right to fulfill was moved
    /// elsewhere.
    #[error("promise already fulfilled")]
    AlreadyFulfilled,
    /// The promise was dropped before it was fulfilled.
    #[error("promise not fulfilled")]
    BrokenPromise,
    /// The producer fulfilled the promise with a failure.
    #[error("promise rejected: {0}")]
    Rejected(Failure),
    /// The producer handed to `await_promise` failed on its own.
    #[error("producer failed: {0}")]
    Producer(Failure),
}
