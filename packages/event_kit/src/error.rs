use thiserror::Error;

/// Errors that can occur when attaching a listener to an event target.
///
/// Detaching never fails, so every variant here originates from an attach attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller supplied an event type that the target cannot listen for.
    #[error("invalid event type: '{event_type}'")]
    InvalidEventType {
        /// The event type that was rejected.
        event_type: String,
    },

    /// The event target refused to accept the listener.
    #[error("event target rejected listener for '{event_type}': {reason}")]
    AttachRejected {
        /// The event type the listener was to be attached for.
        event_type: String,

        /// A human-readable description of why the target refused the listener.
        reason: String,
    },
}

/// A specialized `Result` type for listener operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
