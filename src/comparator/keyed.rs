//! Comparator for entries that carry an integer priority key.

use std::cmp::Ordering;
use std::fmt;

use crate::comparator::tuned_width;
use crate::traits::CqComparator;

/// Orders entries by an `i64` key extracted with `key_fn`, binning keys into
/// integer-width bins.
///
/// Entries with equal keys compare equal, so they dequeue in insertion order.
///
/// ```
/// use calqueue::comparator::KeyedComparator;
/// use calqueue::queue::CalendarQueue;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Job {
///     deadline: i64,
///     name: &'static str,
/// }
///
/// let mut queue = CalendarQueue::new(KeyedComparator::new(|job: &Job| job.deadline));
/// queue.put(Job { deadline: 30, name: "flush" });
/// queue.put(Job { deadline: 10, name: "poll" });
/// queue.put(Job { deadline: 10, name: "tick" });
///
/// assert_eq!(queue.take().unwrap().name, "poll");
/// assert_eq!(queue.take().unwrap().name, "tick");
/// assert_eq!(queue.take().unwrap().name, "flush");
/// ```
#[derive(Clone)]
pub struct KeyedComparator<T, F> {
    key_fn: F,
    zero: i64,
    bin_width: i64,
    default_width: i64,
    fixed: bool,
    _entry: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> KeyedComparator<T, F>
where
    F: Fn(&T) -> i64,
{
    /// Creates a self-tuning comparator with a default width of 1.
    pub fn new(key_fn: F) -> Self {
        Self::with_default_width(key_fn, 1)
    }

    /// Creates a self-tuning comparator that falls back to `width` when no
    /// usable sample is available. Widths below 1 are raised to 1.
    pub fn with_default_width(key_fn: F, width: i64) -> Self {
        let width = width.max(1);
        Self {
            key_fn,
            zero: 0,
            bin_width: width,
            default_width: width,
            fixed: false,
            _entry: std::marker::PhantomData,
        }
    }

    /// Creates a comparator that always uses `width` (at least 1).
    pub fn with_fixed_width(key_fn: F, width: i64) -> Self {
        Self {
            fixed: true,
            ..Self::with_default_width(key_fn, width)
        }
    }

    /// Key of `entry`.
    #[inline]
    pub fn key(&self, entry: &T) -> i64 {
        (self.key_fn)(entry)
    }

    /// Current bin width.
    #[inline]
    pub fn bin_width(&self) -> i64 {
        self.bin_width
    }
}

impl<T, F> fmt::Debug for KeyedComparator<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedComparator")
            .field("zero", &self.zero)
            .field("bin_width", &self.bin_width)
            .field("fixed", &self.fixed)
            .finish_non_exhaustive()
    }
}

impl<T, F> CqComparator<T> for KeyedComparator<T, F>
where
    F: Fn(&T) -> i64,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }

    #[inline]
    fn virtual_bin_number(&self, entry: &T) -> i64 {
        self.key(entry).wrapping_sub(self.zero).div_euclid(self.bin_width)
    }

    fn set_zero_reference(&mut self, entry: &T) {
        self.zero = self.key(entry);
    }

    fn set_bin_width(&mut self, sample: Option<&[T]>) {
        if self.fixed {
            return;
        }
        let tuned = sample.and_then(|entries| {
            let positions: Vec<f64> = entries.iter().map(|e| self.key(e) as f64).collect();
            tuned_width(&positions)
        });
        self.bin_width = match tuned {
            Some(width) => (width.round() as i64).max(1),
            None => self.default_width,
        };
    }
}
