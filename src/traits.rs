//! # Comparator Contract
//!
//! The calendar queue never inspects entries directly. Everything it needs to
//! know about an entry comes from a caller-supplied [`CqComparator`]: how two
//! entries order, where an entry sits on the virtual timeline, where that
//! timeline starts, and how wide one virtual bin should be.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                          CqComparator<T>                                 │
//!   │                                                                          │
//!   │  compare(&, &T, &T) → Ordering          total order over entries         │
//!   │  virtual_bin_number(&, &T) → i64        position on the virtual timeline │
//!   │  set_zero_reference(&mut, &T)           origin of the timeline           │
//!   │  set_bin_width(&mut, Option<&[T]>)      re-tune width from a sample      │
//!   └──────────────────────────────────────────────────────────────────────────┘
//!
//!   virtual timeline (infinite)
//!   ─────────────────────────────────────────────────────────────────────────►
//!   │ bin 0 │ bin 1 │ bin 2 │ bin 3 │ bin 4 │ bin 5 │ bin 6 │ bin 7 │ ...
//!       │       │       │       │       │       │       │       │
//!       ▼       ▼       ▼       ▼       ▼       ▼       ▼       ▼
//!   physical buckets (4):   vbin & 0b11
//!   │   0   │   1   │   2   │   3   │   0   │   1   │   2   │   3   │
//! ```
//!
//! ## Obligations
//!
//! - `compare` must be a strict weak ordering.
//! - `virtual_bin_number` must be monotone with respect to `compare`: if
//!   `compare(a, b) == Less` then `virtual_bin_number(a) <= virtual_bin_number(b)`.
//! - The projection of an entry must not change while it is queued. The queue
//!   locates entries for [`remove`](crate::queue::CalendarQueue::remove) and
//!   [`contains`](crate::queue::CalendarQueue::contains) by recomputing it.
//!
//! None of these are checked at runtime. A comparator that breaks them yields
//! unspecified ordering, not an error.
//!
//! Stock implementations live in [`crate::comparator`].

use std::cmp::Ordering;

/// Ordering and partitioning strategy consumed by
/// [`CalendarQueue`](crate::queue::CalendarQueue).
///
/// # Example
///
/// A comparator for `u64` ticks with a fixed width of 10 ticks per bin:
///
/// ```
/// use std::cmp::Ordering;
///
/// use calqueue::queue::CalendarQueue;
/// use calqueue::traits::CqComparator;
///
/// struct Ticks {
///     zero: u64,
/// }
///
/// impl CqComparator<u64> for Ticks {
///     fn compare(&self, a: &u64, b: &u64) -> Ordering {
///         a.cmp(b)
///     }
///
///     fn virtual_bin_number(&self, entry: &u64) -> i64 {
///         (*entry as i64 - self.zero as i64).div_euclid(10)
///     }
///
///     fn set_zero_reference(&mut self, entry: &u64) {
///         self.zero = *entry;
///     }
///
///     fn set_bin_width(&mut self, _sample: Option<&[u64]>) {}
/// }
///
/// let mut queue = CalendarQueue::new(Ticks { zero: 0 });
/// for tick in [40, 7, 19, 3] {
///     queue.put(tick);
/// }
/// assert_eq!(queue.take(), Ok(3));
/// assert_eq!(queue.take(), Ok(7));
/// ```
pub trait CqComparator<T> {
    /// Orders two entries.
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Projects `entry` onto the virtual timeline.
    fn virtual_bin_number(&self, entry: &T) -> i64;

    /// Anchors the timeline at `entry`.
    ///
    /// Called once, with the first entry put into a new or cleared queue.
    fn set_zero_reference(&mut self, entry: &T);

    /// Recomputes the virtual bin width.
    ///
    /// `None` asks for the default width (the queue has just been
    /// initialized). `Some(sample)` carries recently dequeued entries in
    /// ascending order; called when the bucket array is resized.
    fn set_bin_width(&mut self, sample: Option<&[T]>);
}

impl<T, C> CqComparator<T> for &mut C
where
    C: CqComparator<T> + ?Sized,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }

    #[inline]
    fn virtual_bin_number(&self, entry: &T) -> i64 {
        (**self).virtual_bin_number(entry)
    }

    #[inline]
    fn set_zero_reference(&mut self, entry: &T) {
        (**self).set_zero_reference(entry)
    }

    #[inline]
    fn set_bin_width(&mut self, sample: Option<&[T]>) {
        (**self).set_bin_width(sample)
    }
}

impl<T, C> CqComparator<T> for Box<C>
where
    C: CqComparator<T> + ?Sized,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }

    #[inline]
    fn virtual_bin_number(&self, entry: &T) -> i64 {
        (**self).virtual_bin_number(entry)
    }

    #[inline]
    fn set_zero_reference(&mut self, entry: &T) {
        (**self).set_zero_reference(entry)
    }

    #[inline]
    fn set_bin_width(&mut self, sample: Option<&[T]>) {
        (**self).set_bin_width(sample)
    }
}
