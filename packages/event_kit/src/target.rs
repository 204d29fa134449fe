//! Event sources that listeners attach to.
//!
//! An [`EventTarget`] is the platform primitive underneath [`Listener`][crate::Listener]: it
//! knows how to start and stop delivering events of a named type to a callback. The toolkit
//! never dispatches platform events itself, it only records what it attached so that it can
//! detach exactly that later.
//!
//! [`LocalEventTarget`] is an in-memory implementation for code that wants DOM-like
//! listener semantics without a DOM.

use std::rc::Rc;

use crate::{ListenerOptions, Result};

mod local;

pub use local::*;

/// A callback that receives events of type `E` from an [`EventTarget`].
///
/// Callbacks are compared by pointer identity. Clone the `Rc` to attach and later detach
/// the same callback; two closures with identical code are still different callbacks.
pub type EventCallback<E> = Rc<dyn Fn(&E)>;

/// A source of named events that callbacks can be attached to and detached from.
///
/// Registrations are identified by the event type, the callback identity and the
/// `capture` flag of the options.
#[cfg_attr(test, mockall::automock(type Event = u32;))]
pub trait EventTarget {
    /// The payload delivered to callbacks.
    type Event;

    /// Starts delivering events of `event_type` to `callback`.
    ///
    /// Attaching a registration that is already attached is not an error and has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot accept a listener for this event type.
    fn add_event_listener(
        &self,
        event_type: &str,
        callback: &EventCallback<Self::Event>,
        options: ListenerOptions,
    ) -> Result<()>;

    /// Stops delivering events of `event_type` to `callback`.
    ///
    /// Detaching a registration that is not attached must be a silent no-op.
    fn remove_event_listener(
        &self,
        event_type: &str,
        callback: &EventCallback<Self::Event>,
        options: ListenerOptions,
    );
}
