//! Comparator for discrete-event scheduler entries.
//!
//! A discrete-event scheduler orders events by model time first, then by
//! microstep (the index of a firing within one instant), then by depth (the
//! topological position of the receiving actor). Only the timestamp takes
//! part in binning, so all events of one instant share a bin.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::comparator::float::DEFAULT_BIN_WIDTH;
use crate::comparator::{bin_of, tuned_width};
use crate::traits::CqComparator;

/// An entry with a place in superdense time.
pub trait Timed {
    /// Model time of the event.
    fn timestamp(&self) -> f64;

    /// Firing index within one timestamp.
    fn microstep(&self) -> u64 {
        0
    }

    /// Topological depth of the destination; lower fires first.
    fn depth(&self) -> u32 {
        0
    }
}

impl Timed for f64 {
    fn timestamp(&self) -> f64 {
        *self
    }
}

impl<T: Timed + ?Sized> Timed for &T {
    fn timestamp(&self) -> f64 {
        (**self).timestamp()
    }

    fn microstep(&self) -> u64 {
        (**self).microstep()
    }

    fn depth(&self) -> u32 {
        (**self).depth()
    }
}

/// Lexicographic `(timestamp, microstep, depth)` ordering with timestamp
/// binning.
///
/// ```
/// use calqueue::comparator::{Timed, TimedComparator};
/// use calqueue::queue::CalendarQueue;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Event {
///     time: f64,
///     step: u64,
///     depth: u32,
/// }
///
/// impl Timed for Event {
///     fn timestamp(&self) -> f64 { self.time }
///     fn microstep(&self) -> u64 { self.step }
///     fn depth(&self) -> u32 { self.depth }
/// }
///
/// let mut queue = CalendarQueue::new(TimedComparator::new());
/// queue.put(Event { time: 1.0, step: 1, depth: 0 });
/// queue.put(Event { time: 1.0, step: 0, depth: 5 });
/// queue.put(Event { time: 1.0, step: 0, depth: 2 });
/// queue.put(Event { time: 0.5, step: 9, depth: 9 });
///
/// let order: Vec<(f64, u64, u32)> = std::iter::from_fn(|| queue.take().ok())
///     .map(|e| (e.time, e.step, e.depth))
///     .collect();
/// assert_eq!(order, vec![(0.5, 9, 9), (1.0, 0, 2), (1.0, 0, 5), (1.0, 1, 0)]);
/// ```
pub struct TimedComparator<T> {
    zero: f64,
    bin_width: f64,
    _entry: PhantomData<fn(&T)>,
}

impl<T> TimedComparator<T> {
    /// Creates a self-tuning comparator with width [`DEFAULT_BIN_WIDTH`].
    pub fn new() -> Self {
        Self {
            zero: 0.0,
            bin_width: DEFAULT_BIN_WIDTH,
            _entry: PhantomData,
        }
    }

    /// Current bin width.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }
}

impl<T> Default for TimedComparator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TimedComparator<T> {
    fn clone(&self) -> Self {
        Self {
            zero: self.zero,
            bin_width: self.bin_width,
            _entry: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TimedComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedComparator")
            .field("zero", &self.zero)
            .field("bin_width", &self.bin_width)
            .finish()
    }
}

impl<T: Timed> CqComparator<T> for TimedComparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.timestamp()
            .total_cmp(&b.timestamp())
            .then_with(|| a.microstep().cmp(&b.microstep()))
            .then_with(|| a.depth().cmp(&b.depth()))
    }

    #[inline]
    fn virtual_bin_number(&self, entry: &T) -> i64 {
        bin_of(entry.timestamp(), self.zero, self.bin_width)
    }

    fn set_zero_reference(&mut self, entry: &T) {
        self.zero = entry.timestamp();
    }

    fn set_bin_width(&mut self, sample: Option<&[T]>) {
        let tuned = sample.and_then(|entries| {
            let positions: Vec<f64> = entries.iter().map(Timed::timestamp).collect();
            tuned_width(&positions)
        });
        self.bin_width = tuned.unwrap_or(DEFAULT_BIN_WIDTH);
    }
}
