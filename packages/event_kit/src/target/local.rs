use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::{Error, EventCallback, EventTarget, ListenerOptions, Result};

#[derive(derive_more::Debug)]
struct Registration<E> {
    event_type: String,
    #[debug(ignore)]
    callback: EventCallback<E>,
    options: ListenerOptions,

    // Shared with dispatches in progress so they skip the registration once it is removed.
    removed: Rc<Cell<bool>>,
}

impl<E> Registration<E> {
    fn matches(&self, event_type: &str, callback: &EventCallback<E>, capture: bool) -> bool {
        self.event_type == event_type
            && Rc::ptr_eq(&self.callback, callback)
            && self.options.capture() == capture
    }
}

/// An in-memory [`EventTarget`] with DOM-like registration semantics.
///
/// * A registration is identified by (event type, callback identity, `capture`). Adding a
///   registration that already exists is ignored.
/// * [`dispatch()`][Self::dispatch] invokes matching callbacks in registration order. The
///   set of callbacks is fixed when dispatch starts: registrations added by a callback wait
///   for the next dispatch, while registrations removed by a callback are not invoked by the
///   dispatch in progress.
/// * Registrations with [`ListenerOptions::once()`] are removed just before their first
///   invocation.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use event_kit::{EventCallback, EventTarget, ListenerOptions, LocalEventTarget};
///
/// let target = LocalEventTarget::<u32>::new();
/// let seen = Rc::new(Cell::new(0));
///
/// let callback: EventCallback<u32> = Rc::new({
///     let seen = Rc::clone(&seen);
///     move |value| seen.set(*value)
/// });
///
/// target
///     .add_event_listener("keyup", &callback, ListenerOptions::new())
///     .unwrap();
/// assert_eq!(target.dispatch("keyup", &7), 1);
/// assert_eq!(seen.get(), 7);
/// ```
#[derive(derive_more::Debug)]
pub struct LocalEventTarget<E> {
    registrations: RefCell<Vec<Registration<E>>>,
}

impl<E> LocalEventTarget<E> {
    /// Creates a target with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(Vec::new()),
        }
    }

    /// Delivers `event` to every callback registered for `event_type`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, event_type: &str, event: &E) -> usize {
        // No borrow may be held while callbacks run, as they are free to modify registrations.
        let to_call = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(|r| (Rc::clone(&r.callback), Rc::clone(&r.removed), r.options.once()))
            .collect::<Vec<_>>();

        trace!(event_type = %event_type, listeners = to_call.len(), "dispatching event");

        let mut invoked: usize = 0;

        for (callback, removed, once) in &to_call {
            if removed.get() {
                continue;
            }

            if *once {
                self.take_registration(|r| Rc::ptr_eq(&r.removed, removed));
            }

            callback(event);
            invoked = invoked.wrapping_add(1);
        }

        invoked
    }

    fn take_registration(&self, predicate: impl Fn(&Registration<E>) -> bool) {
        let mut registrations = self.registrations.borrow_mut();

        if let Some(index) = registrations.iter().position(predicate) {
            registrations.remove(index).removed.set(true);
        }
    }

    /// Returns the number of registrations for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }
}

impl<E> Default for LocalEventTarget<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventTarget for LocalEventTarget<E> {
    type Event = E;

    fn add_event_listener(
        &self,
        event_type: &str,
        callback: &EventCallback<E>,
        options: ListenerOptions,
    ) -> Result<()> {
        if event_type.is_empty() {
            return Err(Error::InvalidEventType {
                event_type: event_type.to_string(),
            });
        }

        let mut registrations = self.registrations.borrow_mut();

        if registrations
            .iter()
            .any(|r| r.matches(event_type, callback, options.capture()))
        {
            return Ok(());
        }

        registrations.push(Registration {
            event_type: event_type.to_string(),
            callback: Rc::clone(callback),
            options,
            removed: Rc::new(Cell::new(false)),
        });

        Ok(())
    }

    fn remove_event_listener(
        &self,
        event_type: &str,
        callback: &EventCallback<E>,
        options: ListenerOptions,
    ) {
        self.take_registration(|r| r.matches(event_type, callback, options.capture()));
    }
}
