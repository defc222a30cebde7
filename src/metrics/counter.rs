use std::sync::atomic::{AtomicU64, Ordering};

/// Event count for the read-only queue paths (`contains`, `to_vec_limit`).
///
/// Those paths take `&self`, so the count lives in an atomic and a queue
/// shared between threads stays free of data races. Counts are not used to
/// order any other memory, so `Relaxed` is enough.
#[derive(Debug, Default)]
pub struct ReadCounter(AtomicU64);

impl ReadCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}
