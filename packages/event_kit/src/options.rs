/// Options that accompany a listener when it is attached to an event target.
///
/// Targets use `capture` as part of the identity of a registration, so the same callback
/// can be registered once for the capture phase and once for the bubble phase. The other
/// flags only influence how a registration behaves once attached.
///
/// A bare `bool` converts into options with only `capture` set to that value.
///
/// # Example
///
/// ```rust
/// use event_kit::ListenerOptions;
///
/// let options = ListenerOptions::new().with_capture(true).with_passive(true);
/// assert!(options.capture());
/// assert!(!options.once());
///
/// let from_bool: ListenerOptions = true.into();
/// assert!(from_bool.capture());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ListenerOptions {
    capture: bool,
    once: bool,
    passive: bool,
}

impl ListenerOptions {
    /// Creates options with every flag cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capture: false,
            once: false,
            passive: false,
        }
    }

    /// Whether the listener is registered for the capture phase.
    #[must_use]
    pub const fn capture(&self) -> bool {
        self.capture
    }

    /// Whether the target drops the registration after its first dispatch.
    #[must_use]
    pub const fn once(&self) -> bool {
        self.once
    }

    /// Whether the listener promises not to cancel the event it receives.
    #[must_use]
    pub const fn passive(&self) -> bool {
        self.passive
    }

    /// Returns a copy with the `capture` flag set to `capture`.
    #[must_use]
    pub const fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Returns a copy with the `once` flag set to `once`.
    #[must_use]
    pub const fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Returns a copy with the `passive` flag set to `passive`.
    #[must_use]
    pub const fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }
}

impl From<bool> for ListenerOptions {
    fn from(capture: bool) -> Self {
        Self::new().with_capture(capture)
    }
}
