use std::mem;

/// The handler lists of one typed event, shared by the local and thread-safe variants.
///
/// Handlers are opaque to this type; the caller supplies the identity comparison. One-shot
/// handlers carry a registration sequence number so that an emit only consumes the one-shot
/// handlers that were registered before it started, even if handlers register more one-shot
/// handlers (or emit again) while the emit is in progress.
#[derive(Debug)]
pub(crate) struct HandlerLists<H> {
    persistent: Vec<H>,
    once: Vec<(u64, H)>,
    next_once_sequence: u64,
}

impl<H> HandlerLists<H>
where
    H: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            persistent: Vec::new(),
            once: Vec::new(),
            next_once_sequence: 0,
        }
    }

    pub(crate) fn push_persistent(&mut self, handler: H) {
        self.persistent.push(handler);
    }

    pub(crate) fn push_once(&mut self, handler: H) {
        let sequence = self.next_once_sequence;
        self.next_once_sequence = self.next_once_sequence.wrapping_add(1);
        self.once.push((sequence, handler));
    }

    /// Removes the first persistent handler for which `is_same` returns `true`.
    pub(crate) fn remove_first_persistent(&mut self, is_same: impl Fn(&H) -> bool) -> bool {
        match self.persistent.iter().position(is_same) {
            Some(index) => {
                self.persistent.remove(index);
                true
            }
            None => false,
        }
    }

    /// Starts an emit: returns the persistent handlers to invoke and a cutoff that separates
    /// the one-shot handlers registered so far from any registered later.
    pub(crate) fn begin_emit(&self) -> (Vec<H>, u64) {
        (self.persistent.clone(), self.next_once_sequence)
    }

    /// Swaps out the one-shot handlers registered before `cutoff`, in registration order.
    ///
    /// Handlers registered at or after `cutoff` stay for a future emit.
    pub(crate) fn take_once_before(&mut self, cutoff: u64) -> Vec<H> {
        let due = self
            .once
            .iter()
            .take_while(|(sequence, _)| *sequence < cutoff)
            .count();

        if due == self.once.len() {
            return mem::take(&mut self.once)
                .into_iter()
                .map(|(_, handler)| handler)
                .collect();
        }

        self.once
            .drain(..due)
            .map(|(_, handler)| handler)
            .collect()
    }

    pub(crate) fn persistent_len(&self) -> usize {
        self.persistent.len()
    }

    pub(crate) fn once_len(&self) -> usize {
        self.once.len()
    }
}
