#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Subscription lifecycle and signaling primitives for single-process applications.
//!
//! This crate provides four building blocks:
//!
//! - [`Listener`] - a callback attached to an [`EventTarget`] that can be detached exactly
//!   once, no matter how often [`Listener::off()`] is called
//! - [`ListenersCollection`] - owns many listeners so a component can detach all of them on
//!   teardown
//! - [`LocalTypedEvent`] / [`TypedEvent`] - typed publish/subscribe channels with persistent
//!   and one-shot handlers
//! - [`Deferred`] - a future settled from the outside via [`Deferred::resolve()`] or
//!   [`Deferred::reject()`]
//!
//! [`LocalEventTarget`] is an in-memory [`EventTarget`] for use where no platform event
//! source exists.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use event_kit::{Deferred, LocalTypedEvent};
//! use futures::executor::block_on;
//!
//! let replies = LocalTypedEvent::<u32>::new();
//! let first_reply = Deferred::<u32, String>::new();
//!
//! replies.once(Rc::new({
//!     let first_reply = first_reply.clone();
//!     move |value: &u32| first_reply.resolve(*value)
//! }));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let _subscription = replies.on(Rc::new({
//!     let seen = Rc::clone(&seen);
//!     move |value: &u32| seen.borrow_mut().push(*value)
//! }));
//!
//! replies.emit(&10);
//! replies.emit(&20);
//!
//! assert_eq!(block_on(first_reply.future()), Ok(10));
//! assert_eq!(*seen.borrow(), vec![10, 20]);
//! ```

mod constants;
mod deferred;
mod error;
mod listener;
mod listeners_collection;
mod options;
mod target;
mod typed_event;

#[cfg(test)]
mod test_utils;

pub(crate) use constants::*;
pub use deferred::*;
pub use error::*;
pub use listener::*;
pub use listeners_collection::*;
pub use options::*;
pub use target::*;
pub use typed_event::*;
