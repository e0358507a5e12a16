use parking_lot::RwLock;
use std::sync::Arc;

/// Shared state behind a `parking_lot` lock.
pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}
