//! Helpers shared by the test modules of this crate.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::EventCallback;

const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `test_fn` on a separate thread and panics if it does not finish within
/// [`WATCHDOG_TIMEOUT`], so a future that is never woken fails the test instead of hanging it.
///
/// Panics from the test body are propagated unchanged.
pub(crate) fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        // If this fails, the watchdog has already given up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(WATCHDOG_TIMEOUT) {
        Ok(result) => {
            test_handle.join().expect("test thread finished after sending its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded {WATCHDOG_TIMEOUT:?} - likely awaiting a future never woken")
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("test thread disconnected without a result"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// The address of a callback, usable inside `Send` mock matchers where the `Rc` is not.
pub(crate) fn callback_address<E>(callback: &EventCallback<E>) -> usize {
    std::rc::Rc::as_ptr(callback).cast::<()>() as usize
}
