// A poisoned lock means a handler list or settlement was left half-updated by a panic while
// the lock was held. We never run user code under our locks, so this indicates a bug and we panic.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - the protected state \
    may be inconsistent and continued execution is not safe";
