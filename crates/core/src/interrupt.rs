//! Cooperative cancellation for in-flight streaming calls.
//!
//! One signal is shared between the stream consumer (the sole checker) and
//! any number of external raisers (the stop socket, a control frame). The
//! consumer polls at line boundaries, so a raise that races with a line
//! being processed is observed no later than the next boundary.

use std::sync::atomic::{AtomicBool, Ordering};

/// A shared cancellation flag for the currently running streaming call.
///
/// Lifecycle: cleared at the start of each streaming call, may be raised at
/// any time during that call, observed at most once per call. The signal
/// owns no streaming resources; it only asks the consumer to stop reading.
#[derive(Debug, Default)]
pub struct InterruptSignal {
    raised: AtomicBool,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Idempotent; callable from any thread.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Clear the signal before a new streaming call begins.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    /// Check the signal without blocking.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
