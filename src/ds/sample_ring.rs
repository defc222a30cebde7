//! Fixed-size ring of recently dequeued entries.
//!
//! The calendar queue re-tunes its bin width from the spacing of entries it
//! has recently handed out. `SampleRing` keeps the last `K` such entries in a
//! circular buffer and can present them oldest-first without copying.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                       SampleRing<T, K=4> Layout                             │
//! │                                                                             │
//! │   entries: Vec<T> (capacity K)      cursor: next write position             │
//! │   full: wrapped at least once       (wraps around when full)                │
//! │                                                                             │
//! │   After recording: 10, 20, 30, 40, 50                                       │
//! │                                                                             │
//! │   Index:     0     1     2     3                                            │
//! │            ┌─────┬─────┬─────┬─────┐                                        │
//! │   entries: │ 50  │ 20  │ 30  │ 40  │                                        │
//! │            └─────┴─────┴─────┴─────┘                                        │
//! │                    ▲                                                        │
//! │                    │                                                        │
//! │                 cursor = 1 (oldest entry, next overwrite)                   │
//! │                                                                             │
//! │   make_chronological():                                                     │
//! │     entries.rotate_left(cursor) → [20, 30, 40, 50], cursor = 0              │
//! │                                                                             │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation              | Description                        | Complexity |
//! |------------------------|------------------------------------|------------|
//! | [`record`]             | Add entry (overwrites oldest)      | O(1)       |
//! | [`most_recent`]        | Last recorded entry                | O(1)       |
//! | [`make_chronological`] | Oldest-first slice of the ring     | O(K)       |
//!
//! [`record`]: SampleRing::record
//! [`most_recent`]: SampleRing::most_recent
//! [`make_chronological`]: SampleRing::make_chronological
//!
//! ## Example Usage
//!
//! ```
//! use calqueue::ds::SampleRing;
//!
//! let mut ring = SampleRing::<u64, 3>::new();
//! for t in [10, 20, 30, 40] {
//!     ring.record(t);
//! }
//! assert!(ring.is_full());
//! assert_eq!(ring.most_recent(), Some(&40));
//! assert_eq!(ring.make_chronological(), &[20, 30, 40]);
//! ```
//!
//! ## Thread Safety
//!
//! `SampleRing` is not thread-safe. It is embedded in the queue and shares
//! the queue's synchronization.

/// Circular buffer of the last `K` recorded entries.
#[derive(Debug, Clone)]
pub struct SampleRing<T, const K: usize> {
    entries: Vec<T>,
    cursor: usize,
    full: bool,
}

impl<T, const K: usize> SampleRing<T, K> {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(K),
            cursor: 0,
            full: false,
        }
    }

    /// Returns the number of entries retained once the ring is full.
    pub fn capacity(&self) -> usize {
        K
    }

    /// Returns the number of entries currently stored (<= `K`).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` once `K` entries have been recorded.
    ///
    /// The queue only asks its comparator for a new bin width after this
    /// point.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Records `entry`, overwriting the oldest one when full.
    pub fn record(&mut self, entry: T) {
        if K == 0 {
            return;
        }
        if self.entries.len() < K {
            self.entries.push(entry);
        } else {
            self.entries[self.cursor] = entry;
        }
        self.cursor += 1;
        if self.cursor == K {
            self.cursor = 0;
            self.full = true;
        }
    }

    /// Returns the most recently recorded entry.
    pub fn most_recent(&self) -> Option<&T> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = (self.cursor + K - 1) % K;
        self.entries.get(idx)
    }

    /// Reorders storage oldest-first and returns it.
    ///
    /// Logical contents are unchanged; only the physical rotation moves.
    pub fn make_chronological(&mut self) -> &[T] {
        if self.full && self.cursor != 0 {
            self.entries.rotate_left(self.cursor);
            self.cursor = 0;
        }
        &self.entries
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.full = false;
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.entries.len() <= K);
        if K == 0 {
            assert!(self.entries.is_empty());
            assert_eq!(self.cursor, 0);
            return;
        }
        assert!(self.cursor < K);
        if self.full {
            assert_eq!(self.entries.len(), K);
        } else {
            assert_eq!(self.cursor, self.entries.len() % K);
        }
    }
}

impl<T, const K: usize> Default for SampleRing<T, K> {
    fn default() -> Self {
        Self::new()
    }
}
