//! One-shot cross-thread "producer finished" signal.

use std::sync::atomic::{AtomicBool, Ordering};

/// Written once by the coordinator after the producer thread has joined,
/// read repeatedly by the consumer.
///
/// The release store pairs with the acquire load, so everything the
/// coordinator observed before publishing (the producer's final pushes
/// included) is visible to a consumer that sees the flag set.
#[derive(Debug, Default)]
pub struct FinishedSignal {
    flag: AtomicBool,
}

impl FinishedSignal {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Set the signal. Returns `true` for the call that actually set it.
    pub fn publish(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
