//! Comparator for bare `f64` timestamps.

use std::cmp::Ordering;

use crate::comparator::{bin_of, tuned_width};
use crate::traits::CqComparator;

/// Width used before any sample has been taken.
pub const DEFAULT_BIN_WIDTH: f64 = 1.0;

/// Orders `f64` entries with [`f64::total_cmp`] and bins them by
/// `floor((x - zero) / width)`.
///
/// The width starts at [`DEFAULT_BIN_WIDTH`] and is re-tuned from dequeue
/// samples whenever the queue resizes, unless built with
/// [`with_fixed_width`](Self::with_fixed_width).
///
/// ```
/// use calqueue::comparator::F64Comparator;
/// use calqueue::traits::CqComparator;
///
/// let mut cmp = F64Comparator::new();
/// cmp.set_zero_reference(&10.0);
/// assert_eq!(cmp.virtual_bin_number(&12.5), 2);
///
/// cmp.set_bin_width(Some(&[0.0, 0.5, 1.0, 1.5]));
/// assert_eq!(cmp.bin_width(), 1.5);
/// assert_eq!(cmp.virtual_bin_number(&12.5), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F64Comparator {
    zero: f64,
    bin_width: f64,
    default_width: f64,
    fixed: bool,
}

impl F64Comparator {
    /// Creates a self-tuning comparator.
    pub fn new() -> Self {
        Self {
            zero: 0.0,
            bin_width: DEFAULT_BIN_WIDTH,
            default_width: DEFAULT_BIN_WIDTH,
            fixed: false,
        }
    }

    /// Creates a comparator that always uses `width`.
    ///
    /// Non-positive or non-finite widths are replaced by
    /// [`DEFAULT_BIN_WIDTH`].
    pub fn with_fixed_width(width: f64) -> Self {
        let width = if width.is_finite() && width > 0.0 {
            width
        } else {
            DEFAULT_BIN_WIDTH
        };
        Self {
            zero: 0.0,
            bin_width: width,
            default_width: width,
            fixed: true,
        }
    }

    /// Current bin width.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Current zero reference.
    #[inline]
    pub fn zero_reference(&self) -> f64 {
        self.zero
    }
}

impl Default for F64Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl CqComparator<f64> for F64Comparator {
    #[inline]
    fn compare(&self, a: &f64, b: &f64) -> Ordering {
        a.total_cmp(b)
    }

    #[inline]
    fn virtual_bin_number(&self, entry: &f64) -> i64 {
        bin_of(*entry, self.zero, self.bin_width)
    }

    fn set_zero_reference(&mut self, entry: &f64) {
        self.zero = *entry;
    }

    fn set_bin_width(&mut self, sample: Option<&[f64]>) {
        if self.fixed {
            return;
        }
        self.bin_width = sample
            .and_then(tuned_width)
            .unwrap_or(self.default_width);
    }
}
