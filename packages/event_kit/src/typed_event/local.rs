use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::lists::HandlerLists;

/// A handler subscribed to a [`LocalTypedEvent<T>`].
///
/// Handlers are compared by pointer identity, so keep a clone of the `Rc` if you intend to
/// [`off()`][LocalTypedEvent::off] it later.
pub type LocalHandler<T> = Rc<dyn Fn(&T)>;

type SharedLists<T> = RefCell<HandlerLists<LocalHandler<T>>>;

/// A single-threaded typed publish/subscribe channel.
///
/// Persistent handlers registered via [`on()`][Self::on] receive every emitted value, in
/// registration order. One-shot handlers registered via [`once()`][Self::once] receive only
/// the first value emitted after their registration, after all persistent handlers.
///
/// Handlers run synchronously inside [`emit()`][Self::emit] and may call any method of the
/// same event, including `emit()`. Changes they make to the handler lists apply from the
/// next emit onwards.
///
/// A handler that panics aborts the rest of the emit in progress. The event itself stays
/// usable. If a persistent handler panicked, the one-shot handlers stay registered for the
/// next emit; if a one-shot handler panicked, the one-shot handlers after it are dropped.
///
/// For a variant that can be shared between threads, see [`TypedEvent`][crate::TypedEvent].
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use event_kit::LocalTypedEvent;
///
/// let event = LocalTypedEvent::<i32>::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let _subscription = event.on(Rc::new({
///     let log = Rc::clone(&log);
///     move |value: &i32| log.borrow_mut().push(*value)
/// }));
///
/// event.emit(&1);
/// event.emit(&2);
///
/// event.once(Rc::new({
///     let log = Rc::clone(&log);
///     move |value: &i32| log.borrow_mut().push(100 + *value)
/// }));
///
/// event.emit(&3);
/// event.emit(&4);
///
/// assert_eq!(*log.borrow(), vec![1, 2, 3, 103, 4]);
/// ```
#[derive(derive_more::Debug)]
pub struct LocalTypedEvent<T> {
    #[debug(ignore)]
    lists: Rc<SharedLists<T>>,
}

impl<T> LocalTypedEvent<T> {
    /// Creates an event with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: Rc::new(RefCell::new(HandlerLists::new())),
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
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use event_kit::LocalTypedEvent;
    ///
    /// let resized = LocalTypedEvent::<(u32, u32)>::new();
    /// let area = Rc::new(Cell::new(0));
    ///
    /// let subscription = resized.on(Rc::new({
    ///     let area = Rc::clone(&area);
    ///     move |(width, height): &(u32, u32)| area.set(width * height)
    /// }));
    ///
    /// resized.emit(&(4, 5));
    /// subscription.dispose();
    /// resized.emit(&(10, 10));
    ///
    /// assert_eq!(area.get(), 20);
    /// ```
    pub fn on(&self, handler: LocalHandler<T>) -> LocalSubscription<T> {
        self.lists
            .borrow_mut()
            .push_persistent(Rc::clone(&handler));

        LocalSubscription {
            lists: Rc::downgrade(&self.lists),
            handler,
            disposed: Cell::new(false),
        }
    }

    /// Subscribes `handler` to the next emit only.
    ///
    /// If called while an emit is in progress, the handler waits for the emit after it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use event_kit::LocalTypedEvent;
    ///
    /// let loaded = LocalTypedEvent::<&str>::new();
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    ///
    /// loaded.once(Rc::new({
    ///     let seen = Rc::clone(&seen);
    ///     move |name: &&str| seen.borrow_mut().push(*name)
    /// }));
    ///
    /// loaded.emit(&"first");
    /// loaded.emit(&"second");
    ///
    /// assert_eq!(*seen.borrow(), ["first"]);
    /// ```
    pub fn once(&self, handler: LocalHandler<T>) {
        self.lists.borrow_mut().push_once(handler);
    }

    /// Removes the first persistent registration of `handler`.
    ///
    /// Does nothing if `handler` is not subscribed. One-shot registrations are not affected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use event_kit::{LocalHandler, LocalTypedEvent};
    ///
    /// let event = LocalTypedEvent::<u32>::new();
    /// let calls = Rc::new(Cell::new(0));
    ///
    /// let handler: LocalHandler<u32> = Rc::new({
    ///     let calls = Rc::clone(&calls);
    ///     move |_| calls.set(calls.get() + 1)
    /// });
    ///
    /// let _first = event.on(Rc::clone(&handler));
    /// let _second = event.on(Rc::clone(&handler));
    ///
    /// // Only the first of the two registrations is removed.
    /// event.off(&handler);
    /// event.emit(&1);
    ///
    /// assert_eq!(calls.get(), 1);
    /// ```
    pub fn off(&self, handler: &LocalHandler<T>) {
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
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use event_kit::LocalTypedEvent;
    ///
    /// let source = LocalTypedEvent::<u32>::new();
    /// let sink = LocalTypedEvent::<u32>::new();
    /// let last = Rc::new(Cell::new(0));
    ///
    /// let _subscription = sink.on(Rc::new({
    ///     let last = Rc::clone(&last);
    ///     move |value: &u32| last.set(*value)
    /// }));
    ///
    /// let pipe = source.pipe(&sink);
    /// source.emit(&5);
    /// assert_eq!(last.get(), 5);
    ///
    /// pipe.dispose();
    /// source.emit(&6);
    /// assert_eq!(last.get(), 5);
    /// ```
    pub fn pipe(&self, other: &Self) -> LocalSubscription<T>
    where
        T: 'static,
    {
        let target = Rc::clone(&other.lists);

        self.on(Rc::new(move |event: &T| emit_to(&target, event)))
    }

    /// The number of persistent handlers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lists.borrow().persistent_len()
    }

    /// The number of one-shot handlers waiting for a future emit.
    #[must_use]
    pub fn once_listener_count(&self) -> usize {
        self.lists.borrow().once_len()
    }
}

impl<T> Default for LocalTypedEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_handler<T>(lists: &SharedLists<T>, handler: &LocalHandler<T>) {
    lists
        .borrow_mut()
        .remove_first_persistent(|registered| Rc::ptr_eq(registered, handler));
}

fn emit_to<T>(lists: &SharedLists<T>, event: &T) {
    // No borrow may be held while handlers run, as they are free to modify the lists.
    let (persistent, cutoff) = lists.borrow().begin_emit();

    trace!(handlers = persistent.len(), "emitting local event");

    for handler in &persistent {
        handler(event);
    }

    let once = lists.borrow_mut().take_once_before(cutoff);

    for handler in &once {
        handler(event);
    }
}

/// Unsubscribes a handler registered with [`LocalTypedEvent::on()`].
///
/// The subscription only refers to the event weakly. Disposing it after the event is gone,
/// or disposing it more than once, does nothing.
#[derive(derive_more::Debug)]
pub struct LocalSubscription<T> {
    #[debug(ignore)]
    lists: Weak<SharedLists<T>>,
    #[debug(ignore)]
    handler: LocalHandler<T>,
    disposed: Cell<bool>,
}

impl<T> LocalSubscription<T> {
    /// Removes the handler from the event it was subscribed to.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        if let Some(lists) = self.lists.upgrade() {
            remove_handler(&lists, &self.handler);
        }
    }

    /// Whether [`dispose()`][Self::dispose] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(LocalTypedEvent<u32>: Send, Sync);
    assert_not_impl_any!(LocalSubscription<u32>: Send, Sync);

    type Log = Rc<RefCell<Vec<String>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn recorder(log: &Log, name: &'static str) -> LocalHandler<u32> {
        let log = Rc::clone(log);
        Rc::new(move |value| log.borrow_mut().push(format!("{name}:{value}")))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn persistent_handlers_run_in_registration_order() {
        let event = LocalTypedEvent::new();
        let log = new_log();

        let _a = event.on(recorder(&log, "a"));
        let _b = event.on(recorder(&log, "b"));
        let _c = event.on(recorder(&log, "c"));

        event.emit(&7);

        assert_eq!(entries(&log), ["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn emit_without_handlers_does_nothing() {
        let event = LocalTypedEvent::<u32>::new();

        event.emit(&1);

        assert_eq!(event.listener_count(), 0);
        assert_eq!(event.once_listener_count(), 0);
    }

    #[test]
    fn once_handler_fires_on_next_emit_only() {
        let event = LocalTypedEvent::new();
        let log = new_log();

        event.once(recorder(&log, "once"));
        assert_eq!(event.once_listener_count(), 1);

        event.emit(&1);
        event.emit(&2);

        assert_eq!(entries(&log), ["once:1"]);
        assert_eq!(event.once_listener_count(), 0);
    }

    #[test]
    fn once_handlers_run_after_persistent_handlers() {
        let event = LocalTypedEvent::new();
        let log = new_log();

        event.once(recorder(&log, "first-once"));
        let _p = event.on(recorder(&log, "persistent"));
        event.once(recorder(&log, "second-once"));

        event.emit(&5);

        assert_eq!(
            entries(&log),
            ["persistent:5", "first-once:5", "second-once:5"]
        );
    }

    #[test]
    fn once_registered_during_emit_waits_for_next_emit() {
        let event = Rc::new(LocalTypedEvent::new());
        let log = new_log();

        let _p = event.on(Rc::new({
            let event = Rc::downgrade(&event);
            let log = Rc::clone(&log);
            move |value: &u32| {
                if *value == 1 {
                    if let Some(event) = event.upgrade() {
                        event.once(recorder(&log, "from-persistent"));
                    }
                }
            }
        }));

        event.once(Rc::new({
            let event = Rc::downgrade(&event);
            let log = Rc::clone(&log);
            move |value: &u32| {
                log.borrow_mut().push(format!("outer:{value}"));
                if let Some(event) = event.upgrade() {
                    event.once(recorder(&log, "from-once"));
                }
            }
        }));

        event.emit(&1);
        assert_eq!(entries(&log), ["outer:1"]);
        assert_eq!(event.once_listener_count(), 2);

        event.emit(&2);
        assert_eq!(
            entries(&log),
            ["outer:1", "from-persistent:2", "from-once:2"]
        );
        assert_eq!(event.once_listener_count(), 0);
    }

    #[test]
    fn nested_emit_does_not_fire_once_handlers_twice() {
        let event = Rc::new(LocalTypedEvent::new());
        let log = new_log();

        let _p = event.on(Rc::new({
            let event = Rc::downgrade(&event);
            move |value: &u32| {
                if *value == 1 {
                    if let Some(event) = event.upgrade() {
                        event.emit(&2);
                    }
                }
            }
        }));

        event.once(recorder(&log, "once"));
        event.emit(&1);

        assert_eq!(entries(&log), ["once:2"]);
    }

    #[test]
    fn off_removes_first_occurrence_only() {
        let event = LocalTypedEvent::new();
        let log = new_log();
        let handler = recorder(&log, "h");

        let _first = event.on(Rc::clone(&handler));
        let _second = event.on(Rc::clone(&handler));

        event.off(&handler);
        event.emit(&1);
        assert_eq!(entries(&log), ["h:1"]);

        event.off(&handler);
        event.off(&handler);
        event.emit(&2);
        assert_eq!(entries(&log), ["h:1"]);
    }

    #[test]
    fn off_does_not_touch_once_handlers() {
        let event = LocalTypedEvent::new();
        let log = new_log();
        let handler = recorder(&log, "h");

        event.once(Rc::clone(&handler));
        event.off(&handler);
        event.emit(&3);

        assert_eq!(entries(&log), ["h:3"]);
    }

    #[test]
    fn dispose_unsubscribes_and_is_idempotent() {
        let event = LocalTypedEvent::new();
        let log = new_log();
        let handler = recorder(&log, "h");

        let first = event.on(Rc::clone(&handler));
        let _second = event.on(handler);

        first.dispose();
        assert!(first.is_disposed());
        assert_eq!(event.listener_count(), 1);

        first.dispose();
        assert_eq!(event.listener_count(), 1);

        event.emit(&1);
        assert_eq!(entries(&log), ["h:1"]);
    }

    #[test]
    fn dispose_after_event_dropped_is_noop() {
        let event = LocalTypedEvent::new();
        let subscription = event.on(recorder(&new_log(), "h"));

        drop(event);

        subscription.dispose();
        assert!(subscription.is_disposed());
    }

    #[test]
    fn handler_can_unsubscribe_itself_during_emit() {
        let event = Rc::new(LocalTypedEvent::new());
        let log = new_log();
        let slot: Rc<RefCell<Option<LocalSubscription<u32>>>> = Rc::new(RefCell::new(None));

        let subscription = event.on(Rc::new({
            let slot = Rc::clone(&slot);
            let log = Rc::clone(&log);
            move |value: &u32| {
                log.borrow_mut().push(format!("self:{value}"));
                if let Some(subscription) = slot.borrow().as_ref() {
                    subscription.dispose();
                }
            }
        }));
        *slot.borrow_mut() = Some(subscription);
        let _tail = event.on(recorder(&log, "tail"));

        event.emit(&1);
        event.emit(&2);

        assert_eq!(entries(&log), ["self:1", "tail:1", "tail:2"]);
    }

    #[test]
    fn panicking_handler_aborts_rest_of_emit() {
        let event = LocalTypedEvent::new();
        let log = new_log();

        let _a = event.on(recorder(&log, "a"));
        let _boom = event.on(Rc::new(|value: &u32| {
            assert_ne!(*value, 1, "handler failure");
        }));
        let _c = event.on(recorder(&log, "c"));
        event.once(recorder(&log, "once"));

        let result = catch_unwind(AssertUnwindSafe(|| event.emit(&1)));
        assert!(result.is_err());
        assert_eq!(entries(&log), ["a:1"]);

        // The one-shot handler was never reached, so it is still waiting.
        event.emit(&2);
        assert_eq!(entries(&log), ["a:1", "a:2", "c:2", "once:2"]);
    }

    #[test]
    fn pipe_forwards_in_order() {
        let source = LocalTypedEvent::new();
        let sink = LocalTypedEvent::new();
        let log = new_log();

        let _s = sink.on(recorder(&log, "sink"));
        let pipe = source.pipe(&sink);

        source.emit(&1);
        source.emit(&2);
        source.emit(&3);
        assert_eq!(entries(&log), ["sink:1", "sink:2", "sink:3"]);

        pipe.dispose();
        source.emit(&4);
        assert_eq!(entries(&log), ["sink:1", "sink:2", "sink:3"]);
    }

    #[test]
    fn pipe_keeps_forwarding_after_sink_is_dropped() {
        let source = LocalTypedEvent::new();
        let log = new_log();

        let pipe = {
            let sink = LocalTypedEvent::new();
            let _s = sink.on(recorder(&log, "sink"));
            source.pipe(&sink)
        };

        source.emit(&7);
        assert_eq!(entries(&log), ["sink:7"]);

        pipe.dispose();
        source.emit(&8);
        assert_eq!(entries(&log), ["sink:7"]);
    }

    #[test]
    fn pipe_chain_survives_dropped_middle_event() {
        let source = LocalTypedEvent::new();
        let sink = LocalTypedEvent::new();
        let log = new_log();

        let _s = sink.on(recorder(&log, "sink"));
        let _first = {
            let middle = LocalTypedEvent::new();
            let _second = middle.pipe(&sink);
            source.pipe(&middle)
        };

        source.emit(&1);
        assert_eq!(entries(&log), ["sink:1"]);
    }

    #[test]
    fn documented_scenario() {
        let event = LocalTypedEvent::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let _s = event.on(Rc::new({
            let log = Rc::clone(&log);
            move |value: &u32| log.borrow_mut().push(*value)
        }));
        event.emit(&1);
        event.emit(&2);
        assert_eq!(*log.borrow(), [1, 2]);

        event.once(Rc::new({
            let log = Rc::clone(&log);
            move |value: &u32| log.borrow_mut().push(100 + *value)
        }));
        event.emit(&3);
        assert_eq!(*log.borrow(), [1, 2, 3, 103]);

        event.emit(&4);
        assert_eq!(*log.borrow(), [1, 2, 3, 103, 4]);
    }
}
