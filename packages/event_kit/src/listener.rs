use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::{EventCallback, EventTarget, ListenerOptions, Result};

/// A callback attached to an [`EventTarget`] that can later be detached again.
///
/// The listener records the exact target, event type, callback and options it was created
/// with, so detaching never depends on bookkeeping kept elsewhere. The listener starts
/// receiving events the moment it is created and stops when [`off()`][Self::off] is called.
///
/// Dropping a listener does not detach it. Use [`off()`][Self::off] or hand the listener to a
/// [`ListenersCollection`][crate::ListenersCollection] that detaches it on teardown.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use event_kit::{EventCallback, Listener, ListenerOptions, LocalEventTarget};
///
/// let target = Rc::new(LocalEventTarget::<u32>::new());
/// let presses = Rc::new(Cell::new(0));
///
/// let callback: EventCallback<u32> = Rc::new({
///     let presses = Rc::clone(&presses);
///     move |_| presses.set(presses.get() + 1)
/// });
///
/// let listener = Listener::new(Rc::clone(&target), "keyup", callback, ListenerOptions::new())
///     .unwrap();
///
/// target.dispatch("keyup", &13);
/// listener.off();
/// target.dispatch("keyup", &13);
///
/// assert_eq!(presses.get(), 1);
/// ```
#[derive(derive_more::Debug)]
pub struct Listener<T>
where
    T: EventTarget + ?Sized,
{
    #[debug(ignore)]
    target: Rc<T>,
    event_type: String,
    #[debug(ignore)]
    callback: EventCallback<T::Event>,
    options: ListenerOptions,

    // Set once by `off()`; never cleared.
    detached: Cell<bool>,
}

impl<T> Listener<T>
where
    T: EventTarget + ?Sized,
{
    /// Attaches `callback` to `target` for events of `event_type` and returns the listener
    /// representing that attachment.
    ///
    /// # Errors
    ///
    /// Returns whatever error the target reports when it refuses the attachment. No listener
    /// is created in that case.
    pub fn new(
        target: Rc<T>,
        event_type: impl Into<String>,
        callback: EventCallback<T::Event>,
        options: impl Into<ListenerOptions>,
    ) -> Result<Self> {
        let event_type = event_type.into();
        let options = options.into();

        target.add_event_listener(&event_type, &callback, options)?;

        trace!(event_type = %event_type, "listener attached");

        Ok(Self {
            target,
            event_type,
            callback,
            options,
            detached: Cell::new(false),
        })
    }

    /// Detaches the callback from the target.
    ///
    /// Only the first call reaches the target. Later calls do nothing.
    pub fn off(&self) {
        if self.detached.replace(true) {
            return;
        }

        self.target
            .remove_event_listener(&self.event_type, &self.callback, self.options);

        trace!(event_type = %self.event_type, "listener detached");
    }

    /// Whether [`off()`][Self::off] has not yet been called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.detached.get()
    }

    /// The event type the callback was attached for.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The options the callback was attached with.
    #[must_use]
    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// The target the callback was attached to.
    #[must_use]
    pub fn target(&self) -> &Rc<T> {
        &self.target
    }
}
