//! Process-wide cooperative shutdown flag.
//!
//! Every blocking point in the server (accept, command reads, the transfer
//! chunk loop) uses a bounded timeout and re-checks this flag when the
//! timeout elapses. Timeout expiry is a wake-up, not an error; nothing is
//! preempted mid-operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the shutdown flag. All clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    raised: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Idempotent; the flag is never lowered again.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
