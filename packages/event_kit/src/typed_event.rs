//! Typed publish/subscribe channels with persistent and one-shot handlers.
//!
//! ## Event Types
//!
//! - [`LocalTypedEvent`] - Single-threaded channel with `Rc` handlers
//! - [`TypedEvent`] - Thread-safe channel with `Arc` handlers, one mutex per event
//!
//! Both deliver each emitted value synchronously: first to every persistent handler in
//! registration order, then to every one-shot handler that was registered before the emit
//! started, also in registration order. One-shot handlers are then forgotten.
//!
//! Handlers registered or removed from inside a handler take effect from the next emit
//! onwards. A handler may also emit on the same event, which runs a complete nested emit
//! before the outer one continues.

mod lists;
mod local;
mod sync;

pub use local::*;
pub use sync::*;
