//! Futures that are settled by whoever holds the handle, not by the code that awaits them.

use std::future::{Future, IntoFuture};
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use tracing::trace;

use crate::ERR_POISONED_LOCK;

const STATUS_PENDING: u8 = 0;
const STATUS_RESOLVED: u8 = 1;
const STATUS_REJECTED: u8 = 2;

#[derive(Debug)]
enum State<T, E> {
    /// Not settled yet. Holds the wakers of every future that has polled so far.
    Pending(Vec<Waker>),

    Resolved(T),

    Rejected(E),
}

#[derive(derive_more::Debug)]
struct Shared<T, E> {
    #[debug(ignore)]
    state: Mutex<State<T, E>>,

    // Mirrors the variant of `state` so status queries do not need the lock.
    // Only written while the lock is held.
    status: AtomicU8,
}

/// A future whose outcome is decided by calling [`resolve()`][Self::resolve] or
/// [`reject()`][Self::reject] on the handle.
///
/// The handle is cheap to clone and every clone refers to the same outcome, so one part of
/// a program can await [`future()`][Self::future] while another part settles it. The first
/// call to `resolve()` or `reject()` decides the outcome; every later call is ignored.
///
/// Awaiting yields `Ok(value)` after `resolve(value)` and `Err(reason)` after
/// `reject(reason)`. Any number of futures may be created and awaited; each receives a clone
/// of the outcome. A future whose deferred is never settled stays pending forever.
///
/// The handle can be shared between threads if both `T` and `E` are `Send`.
///
/// # Example
///
/// ```rust
/// use event_kit::Deferred;
/// use futures::executor::block_on;
///
/// let deferred = Deferred::<u32, String>::new();
/// let response = deferred.future();
///
/// // Typically done by code that has nothing to do with the awaiting side,
/// // e.g. a message handler correlating a reply with this request.
/// deferred.resolve(42);
/// deferred.reject("too late".to_string());
///
/// assert_eq!(block_on(response), Ok(42));
/// assert!(deferred.is_resolved());
/// ```
#[derive(derive_more::Debug)]
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Creates a pending deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending(Vec::new())),
                status: AtomicU8::new(STATUS_PENDING),
            }),
        }
    }

    /// Settles the deferred successfully with `value`.
    ///
    /// Does nothing if the deferred has already been settled.
    pub fn resolve(&self, value: T) {
        self.settle(State::Resolved(value), STATUS_RESOLVED);
    }

    /// Settles the deferred with the failure `reason`.
    ///
    /// Does nothing if the deferred has already been settled.
    pub fn reject(&self, reason: E) {
        self.settle(State::Rejected(reason), STATUS_REJECTED);
    }

    fn settle(&self, outcome: State<T, E>, status: u8) {
        let wakers = {
            let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);

            let State::Pending(wakers) = &mut *state else {
                trace!("ignoring settlement of an already settled deferred");
                return;
            };

            let wakers = mem::take(wakers);
            *state = outcome;
            self.shared.status.store(status, Ordering::Release);

            wakers
        };

        // Woken futures take the lock to read the outcome, so wake only after releasing it.
        for waker in wakers {
            waker.wake();
        }
    }

    /// Whether neither [`resolve()`][Self::resolve] nor [`reject()`][Self::reject] has
    /// taken effect yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == STATUS_PENDING
    }

    /// Whether the deferred was settled by [`resolve()`][Self::resolve].
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status() == STATUS_RESOLVED
    }

    /// Whether the deferred was settled by [`reject()`][Self::reject].
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status() == STATUS_REJECTED
    }

    fn status(&self) -> u8 {
        self.shared.status.load(Ordering::Acquire)
    }

    /// Returns a future that completes with the outcome of this deferred.
    #[must_use]
    pub fn future(&self) -> DeferredFuture<T, E> {
        DeferredFuture {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;
    type IntoFuture = DeferredFuture<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        DeferredFuture {
            shared: self.shared,
        }
    }
}

/// The awaiting side of a [`Deferred`].
///
/// Completes with `Ok` after the deferred is resolved or `Err` after it is rejected.
#[derive(derive_more::Debug)]
pub struct DeferredFuture<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Future for DeferredFuture<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);

        match &mut *state {
            State::Pending(wakers) => {
                if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }

                Poll::Pending
            }
            State::Resolved(value) => Poll::Ready(Ok(value.clone())),
            State::Rejected(reason) => Poll::Ready(Err(reason.clone())),
        }
    }
}
