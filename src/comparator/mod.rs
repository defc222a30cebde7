//! Stock [`CqComparator`](crate::traits::CqComparator) implementations.
//!
//! | Comparator           | Entries                         | Timeline             |
//! |----------------------|---------------------------------|----------------------|
//! | [`F64Comparator`]    | `f64` timestamps                | `f64`, tuned width   |
//! | [`KeyedComparator`]  | any `T` with an `i64` key       | integer, tuned width |
//! | [`TimedComparator`]  | any [`Timed`] event             | timestamp, tuned     |
//!
//! All three re-tune their bin width with [`tuned_width`] unless a fixed
//! width was requested.

pub mod float;
pub mod keyed;
pub mod timed;

pub use float::F64Comparator;
pub use keyed::KeyedComparator;
pub use timed::{Timed, TimedComparator};

/// Bin width derived from ascending sample positions.
///
/// Takes the gaps between consecutive positions, drops gaps of at least
/// twice the mean gap, and returns three times the mean of what remains.
/// Returns `None` when there are fewer than two positions or the result is
/// not a positive finite number; callers then fall back to their default.
///
/// ```
/// use calqueue::comparator::tuned_width;
///
/// // Gaps 1, 1, 1, 9: mean 3, so 9 is an outlier and the width is 3 * 1.
/// assert_eq!(tuned_width(&[0.0, 1.0, 2.0, 3.0, 12.0]), Some(3.0));
/// assert_eq!(tuned_width(&[5.0]), None);
/// assert_eq!(tuned_width(&[2.0, 2.0, 2.0]), None);
/// ```
pub fn tuned_width(positions: &[f64]) -> Option<f64> {
    if positions.len() < 2 {
        return None;
    }
    let gaps: Vec<f64> = positions.windows(2).map(|w| w[1] - w[0]).collect();
    let average = gaps.iter().sum::<f64>() / gaps.len() as f64;

    let (sum, count) = gaps
        .iter()
        .filter(|&&gap| gap < 2.0 * average)
        .fold((0.0, 0usize), |(sum, count), gap| (sum + gap, count + 1));
    if count == 0 {
        return None;
    }
    let width = 3.0 * (sum / count as f64);
    (width.is_finite() && width > 0.0).then_some(width)
}

/// `floor((position - zero) / width)`, saturating at the `i64` range.
///
/// NaN positions go to the end of the timeline their sign puts them at
/// under [`f64::total_cmp`]: positive NaN to `i64::MAX`, negative NaN to
/// `i64::MIN`.
#[inline]
pub(crate) fn bin_of(position: f64, zero: f64, width: f64) -> i64 {
    if position.is_nan() {
        return if position.is_sign_negative() { i64::MIN } else { i64::MAX };
    }
    // `as` saturates.
    ((position - zero) / width).floor() as i64
}
