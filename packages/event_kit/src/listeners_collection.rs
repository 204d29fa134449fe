use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::debug;

use crate::{EventCallback, EventTarget, Listener, ListenerOptions, Result};

/// Owns a set of [`Listener`]s so they can be detached together.
///
/// Components that attach callbacks to several targets over their lifetime add each one
/// through the collection and call [`remove_all()`][Self::remove_all] on teardown. Every
/// listener the collection owns is active: removing a listener detaches it first.
///
/// Listeners are identified by the `Rc` handle returned from [`add()`][Self::add], not by
/// the values they were created from. Two listeners created from identical arguments are
/// still two independent members of the collection.
///
/// The collection is single-threaded. All methods take `&self`, so a callback that holds
/// the collection (e.g. through an `Rc`) may add or remove listeners while being invoked.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use event_kit::{EventCallback, ListenerOptions, ListenersCollection, LocalEventTarget};
///
/// let window = Rc::new(LocalEventTarget::<()>::new());
/// let textarea = Rc::new(LocalEventTarget::<()>::new());
/// let on_event: EventCallback<()> = Rc::new(|_| {});
///
/// let listeners = ListenersCollection::new();
/// listeners
///     .add(Rc::clone(&window), "resize", Rc::clone(&on_event), ListenerOptions::new())
///     .unwrap();
/// listeners
///     .add(Rc::clone(&textarea), "keyup", on_event, ListenerOptions::new())
///     .unwrap();
/// assert_eq!(listeners.len(), 2);
///
/// listeners.remove_all();
///
/// assert!(listeners.is_empty());
/// assert_eq!(window.listener_count("resize"), 0);
/// assert_eq!(textarea.listener_count("keyup"), 0);
/// ```
#[derive(derive_more::Debug)]
pub struct ListenersCollection<T>
where
    T: EventTarget + ?Sized,
{
    listeners: RefCell<Vec<Rc<Listener<T>>>>,
}

impl<T> ListenersCollection<T>
where
    T: EventTarget + ?Sized,
{
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Attaches `callback` to `target` and keeps the resulting listener.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the target if it refuses the attachment. Nothing is
    /// added to the collection in that case.
    pub fn add(
        &self,
        target: Rc<T>,
        event_type: impl Into<String>,
        callback: EventCallback<T::Event>,
        options: impl Into<ListenerOptions>,
    ) -> Result<Rc<Listener<T>>> {
        let listener = Rc::new(Listener::new(target, event_type, callback, options)?);

        self.listeners.borrow_mut().push(Rc::clone(&listener));

        Ok(listener)
    }

    /// Attaches `callback` to every target in `targets`, one independent listener per target.
    ///
    /// The listeners are created in iteration order and returned in the same order.
    ///
    /// # Errors
    ///
    /// Stops at the first target that refuses the attachment and returns its error. Listeners
    /// created for earlier targets remain owned by the collection.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use event_kit::{EventCallback, ListenerOptions, ListenersCollection, LocalEventTarget};
    ///
    /// let inputs = [
    ///     Rc::new(LocalEventTarget::<()>::new()),
    ///     Rc::new(LocalEventTarget::<()>::new()),
    /// ];
    /// let on_focus: EventCallback<()> = Rc::new(|_| {});
    ///
    /// let listeners = ListenersCollection::new();
    /// let created = listeners
    ///     .add_list(inputs.iter().cloned(), "focus", &on_focus, ListenerOptions::new())
    ///     .unwrap();
    ///
    /// assert_eq!(created.len(), 2);
    /// assert!(inputs.iter().all(|input| input.listener_count("focus") == 1));
    /// ```
    pub fn add_list(
        &self,
        targets: impl IntoIterator<Item = Rc<T>>,
        event_type: &str,
        callback: &EventCallback<T::Event>,
        options: impl Into<ListenerOptions>,
    ) -> Result<Vec<Rc<Listener<T>>>> {
        let options = options.into();

        targets
            .into_iter()
            .map(|target| self.add(target, event_type, Rc::clone(callback), options))
            .collect()
    }

    /// Detaches `listener` and drops it from the collection.
    ///
    /// Does nothing if the collection does not own this listener.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use event_kit::{EventCallback, ListenerOptions, ListenersCollection, LocalEventTarget};
    ///
    /// let window = Rc::new(LocalEventTarget::<()>::new());
    /// let on_resize: EventCallback<()> = Rc::new(|_| {});
    ///
    /// let listeners = ListenersCollection::new();
    /// let listener = listeners
    ///     .add(Rc::clone(&window), "resize", on_resize, ListenerOptions::new())
    ///     .unwrap();
    ///
    /// listeners.remove(&listener);
    ///
    /// assert!(!listener.is_active());
    /// assert!(listeners.is_empty());
    /// assert_eq!(window.listener_count("resize"), 0);
    /// ```
    pub fn remove(&self, listener: &Rc<Listener<T>>) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();

            listeners
                .iter()
                .position(|owned| Rc::ptr_eq(owned, listener))
                .map(|index| listeners.remove(index))
        };

        if let Some(removed) = removed {
            removed.off();
        }
    }

    /// Detaches every owned listener and empties the collection.
    ///
    /// The set of listeners is taken before any of them is detached, so listeners added while
    /// this runs are kept and none of the removed ones is detached twice.
    pub fn remove_all(&self) {
        let listeners = mem::take(&mut *self.listeners.borrow_mut());

        debug!(count = listeners.len(), "removing all listeners");

        for listener in listeners {
            listener.off();
        }
    }

    /// Whether `listener` is owned by this collection.
    #[must_use]
    pub fn contains(&self, listener: &Rc<Listener<T>>) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|owned| Rc::ptr_eq(owned, listener))
    }

    /// The number of owned listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether the collection owns no listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl<T> Default for ListenersCollection<T>
where
    T: EventTarget + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}
