//! The wait/post handshake a [`Promise`](crate::Promise) posts once it is
//! fulfilled.

use parking_lot::{Condvar, Mutex};
use std::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
};

/// A single-use, thread-safe handshake between one waiter and one poster.
///
/// `wait` runs `visitor` on the calling context first and then suspends that
/// context until `post` has been called. If `post` already happened (for
/// example from inside `visitor`) `wait` returns without suspending. How the
/// context suspends (thread park, fiber switch) is up to the implementation.
pub trait Signal: Send + Sync {
    fn wait<F: FnOnce()>(&self, visitor: F);

    /// Wake the waiter. Only the first call has an effect.
    fn post(&self);
}

/// Default number of spins a [`Baton`] makes before parking its thread.
pub const DEFAULT_SPIN_LIMIT: usize = 300;

/// Baton options
#[derive(Debug, Clone)]
pub struct BatonOptions {
    pub spin_limit: usize,
}

impl BatonOptions {
    pub fn new() -> BatonOptions {
        BatonOptions {
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// How often `wait` polls the posted flag before blocking. Zero parks
    /// straight away.
    pub fn spin_limit(&mut self, spins: usize) -> &mut BatonOptions {
        self.spin_limit = spins;
        self
    }
}

impl Default for BatonOptions {
    fn default() -> BatonOptions {
        BatonOptions::new()
    }
}

/// A [`Signal`] that blocks OS threads: a short spin on the posted flag,
/// then a condvar park.
///
/// # Examples
///
/// ```
/// use fiber_promise::{Baton, Signal};
/// use std::{sync::Arc, thread};
///
/// let baton = Arc::new(Baton::new());
/// let poster = baton.clone();
/// baton.wait(move || {
///     thread::spawn(move || poster.post());
/// });
/// assert!(baton.try_wait());
/// ```
#[derive(Debug)]
pub struct Baton {
    posted: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
    options: BatonOptions,
}

impl Baton {
    pub fn new() -> Baton {
        Baton::with_options(BatonOptions::default())
    }

    pub fn with_options(options: BatonOptions) -> Baton {
        Baton {
            posted: AtomicBool::new(false),
            lock: Mutex::new(()),
            cond: Condvar::new(),
            options,
        }
    }

    pub fn options(&self) -> &BatonOptions {
        &self.options
    }

    /// Whether the baton has been posted. Never blocks.
    pub fn try_wait(&self) -> bool {
        self.posted.load(Ordering::Acquire)
    }
}

impl Default for Baton {
    fn default() -> Baton {
        Baton::new()
    }
}

impl Signal for Baton {
    fn wait<F: FnOnce()>(&self, visitor: F) {
        visitor();

        for _ in 0..self.options.spin_limit {
            if self.try_wait() {
                return;
            }
            hint::spin_loop();
        }

        let mut guard = self.lock.lock();
        while !self.try_wait() {
            self.cond.wait(&mut guard);
        }
        tracing::trace!("baton waiter resumed");
    }

    fn post(&self) {
        // The flag flips under the lock so a waiter between its last check
        // and `cond.wait` cannot miss the notification.
        let already = {
            let _guard = self.lock.lock();
            self.posted.swap(true, Ordering::AcqRel)
        };
        if already {
            tracing::warn!("baton posted more than once");
            return;
        }
        self.cond.notify_one();
    }
}
