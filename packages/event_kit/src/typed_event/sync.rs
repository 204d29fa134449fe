use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use super::lists::HandlerLists;
use crate::ERR_POISONED_LOCK;

/// A handler subscribed to a [`TypedEvent<T>`].
///
/// Handlers are compared by pointer identity, so keep a clone of the `Arc` if you intend to
/// [`off()`][TypedEvent::off] it later.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

type SharedLists<T> = Mutex<HandlerLists<Handler<T>>>;

/// A thread-safe typed publish/subscribe channel.
///
/// This has the same semantics as [`LocalTypedEvent`][crate::LocalTypedEvent] but can be
/// shared between threads. Every change to the handler lists happens under one mutex per
/// event. The mutex is never held while handlers run, so handlers may call back into the
/// same event, and emits on different threads may run concurrently.
///
/// Handlers run on the thread that calls [`emit()`][Self::emit].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::thread;
///
/// use event_kit::TypedEvent;
///
/// let event = Arc::new(TypedEvent::<u32>::new());
/// let total = Arc::new(AtomicU32::new(0));
///
/// let _subscription = event.on(Arc::new({
///     let total = Arc::clone(&total);
///     move |value: &u32| {
///         total.fetch_add(*value, Ordering::Relaxed);
///     }
/// }));
///
/// thread::spawn({
///     let event = Arc::clone(&event);
///     move || event.emit(&5)
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(total.load(Ordering::Relaxed), 5);
/// ```
#[derive(derive_more::Debug)]
pub struct TypedEvent<T> {
    #[debug(ignore)]
    lists: Arc<SharedLists<T>>,
}

impl<T> TypedEvent<T> {
    /// Creates an event with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: Arc::new(Mutex::new(HandlerLists::new())),
        }
    }

    /// Subscribes `handler` to every future emit.
    ///
    /// Disposing the returned subscription is equivalent to calling [`off()`][Self::off]
    /// with the same handler. Dropping the subscription does not unsubscribe.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// use event_kit::TypedEvent;
    ///
    /// let progress = TypedEvent::<u32>::new();
    /// let latest = Arc::new(AtomicU32::new(0));
    ///
    /// let subscription = progress.on(Arc::new({
    ///     let latest = Arc::clone(&latest);
    ///     move |percent: &u32| latest.store(*percent, Ordering::Relaxed)
    /// }));
    ///
    /// progress.emit(&40);
    /// subscription.dispose();
    /// progress.emit(&80);
    ///
    /// assert_eq!(latest.load(Ordering::Relaxed), 40);
    /// ```
    pub fn on(&self, handler: Handler<T>) -> Subscription<T> {
        self.lists
            .lock()
            .expect(ERR_POISONED_LOCK)
            .push_persistent(Arc::clone(&handler));

        Subscription {
            lists: Arc::downgrade(&self.lists),
            handler,
            disposed: AtomicBool::new(false),
        }
    }

    /// Subscribes `handler` to the next emit only.
    ///
    /// If called while an emit is in progress, the handler waits for the emit after it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// use event_kit::TypedEvent;
    ///
    /// let connected = TypedEvent::<()>::new();
    /// let calls = Arc::new(AtomicUsize::new(0));
    ///
    /// connected.once(Arc::new({
    ///     let calls = Arc::clone(&calls);
    ///     move |_: &()| {
    ///         calls.fetch_add(1, Ordering::Relaxed);
    ///     }
    /// }));
    ///
    /// connected.emit(&());
    /// connected.emit(&());
    ///
    /// assert_eq!(calls.load(Ordering::Relaxed), 1);
    /// ```
    pub fn once(&self, handler: Handler<T>) {
        self.lists
            .lock()
            .expect(ERR_POISONED_LOCK)
            .push_once(handler);
    }

    /// Removes the first persistent registration of `handler`.
    ///
    /// Does nothing if `handler` is not subscribed. One-shot registrations are not affected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// use event_kit::{Handler, TypedEvent};
    ///
    /// let event = TypedEvent::<u32>::new();
    /// let calls = Arc::new(AtomicUsize::new(0));
    ///
    /// let handler: Handler<u32> = Arc::new({
    ///     let calls = Arc::clone(&calls);
    ///     move |_| {
    ///         calls.fetch_add(1, Ordering::Relaxed);
    ///     }
    /// });
    ///
    /// let _subscription = event.on(Arc::clone(&handler));
    /// event.off(&handler);
    /// event.emit(&1);
    ///
    /// assert_eq!(calls.load(Ordering::Relaxed), 0);
    /// ```
    pub fn off(&self, handler: &Handler<T>) {
        remove_handler(&self.lists, handler);
    }

    /// Delivers `event` to the persistent handlers and then to the due one-shot handlers.
    pub fn emit(&self, event: &T) {
        emit_to(&self.lists, event);
    }

    /// Forwards every value emitted on this event to `other`, in order.
    ///
    /// Equivalent to subscribing a handler that emits each value on `other`. The handler
    /// keeps the handlers of `other` alive, so forwarding continues after `other` itself is
    /// dropped and only stops when the returned subscription is disposed. Two events piped
    /// into each other are never freed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// use event_kit::TypedEvent;
    ///
    /// let source = TypedEvent::<u32>::new();
    /// let sink = TypedEvent::<u32>::new();
    /// let last = Arc::new(AtomicU32::new(0));
    ///
    /// let _subscription = sink.on(Arc::new({
    ///     let last = Arc::clone(&last);
    ///     move |value: &u32| last.store(*value, Ordering::Relaxed)
    /// }));
    ///
    /// let pipe = source.pipe(&sink);
    /// source.emit(&5);
    /// assert_eq!(last.load(Ordering::Relaxed), 5);
    ///
    /// pipe.dispose();
    /// source.emit(&6);
    /// assert_eq!(last.load(Ordering::Relaxed), 5);
    /// ```
    pub fn pipe(&self, other: &Self) -> Subscription<T>
    where
        T: 'static,
    {
        let target = Arc::clone(&other.lists);

        self.on(Arc::new(move |event: &T| emit_to(&target, event)))
    }

    /// The number of persistent handlers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lists.lock().expect(ERR_POISONED_LOCK).persistent_len()
    }

    /// The number of one-shot handlers waiting for a future emit.
    #[must_use]
    pub fn once_listener_count(&self) -> usize {
        self.lists.lock().expect(ERR_POISONED_LOCK).once_len()
    }
}

impl<T> Default for TypedEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_handler<T>(lists: &SharedLists<T>, handler: &Handler<T>) {
    lists
        .lock()
        .expect(ERR_POISONED_LOCK)
        .remove_first_persistent(|registered| Arc::ptr_eq(registered, handler));
}

fn emit_to<T>(lists: &SharedLists<T>, event: &T) {
    let (persistent, cutoff) = lists.lock().expect(ERR_POISONED_LOCK).begin_emit();

    trace!(handlers = persistent.len(), "emitting event");

    for handler in &persistent {
        handler(event);
    }

    let once = lists
        .lock()
        .expect(ERR_POISONED_LOCK)
        .take_once_before(cutoff);

    for handler in &once {
        handler(event);
    }
}

/// Unsubscribes a handler registered with [`TypedEvent::on()`].
///
/// The subscription only refers to the event weakly. Disposing it after the event is gone,
/// or disposing it more than once, does nothing.
#[derive(derive_more::Debug)]
pub struct Subscription<T> {
    #[debug(ignore)]
    lists: Weak<SharedLists<T>>,
    #[debug(ignore)]
    handler: Handler<T>,
    disposed: AtomicBool,
}

impl<T> Subscription<T> {
    /// Removes the handler from the event it was subscribed to.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(lists) = self.lists.upgrade() {
            remove_handler(&lists, &self.handler);
        }
    }

    /// Whether [`dispose()`][Self::dispose] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
