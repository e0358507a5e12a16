use std::sync::atomic::{AtomicU64, Ordering};

/// Counts handled `counter`/`futureCounter` requests.
#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments and returns the new count, starting at 1.
    pub fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}
