//! Bucket-count resize policy.
//!
//! A calendar queue performs best with about one entry per bucket. The
//! policy watches the queue size against two thresholds derived from the
//! current bucket count and asks for a rebuild once the size has stayed past
//! a threshold for [`RESIZE_LAG`] consecutive observations.
//!
//! ```text
//!   bucket count n = 2^k, factor f = 2^g
//!
//!   bottom = n >> g                  top = n << g
//!   ──────────┬─────────────────────────┬──────────────────►  queue size
//!    shrink   │        steady           │   grow
//!    k - g    │                         │   k + g
//! ```
//!
//! Rebuilding is O(queue size), so the lag keeps a queue hovering around a
//! threshold from thrashing. The shrink direction also never rebuilds down
//! to the configured floor, only to sizes strictly above it.
//!
//! The policy only decides; [`CalendarQueue`](crate::queue::CalendarQueue)
//! performs the rebuild.

use crate::error::ConfigError;

/// Consecutive threshold crossings required before a resize fires.
pub const RESIZE_LAG: u32 = 32;

/// Upper bound on `log2(bucket count)`.
pub const MAX_LOG_NUM_BUCKETS: u32 = 30;

/// Returns the exponent of the smallest power of two `>= value`.
///
/// # Errors
///
/// Returns [`ConfigError`] when `value` is zero or exceeds
/// `2^MAX_LOG_NUM_BUCKETS`.
///
/// # Example
///
/// ```
/// use calqueue::policy::resize::ceil_log2;
///
/// assert_eq!(ceil_log2(1), Ok(0));
/// assert_eq!(ceil_log2(2), Ok(1));
/// assert_eq!(ceil_log2(5), Ok(3));
/// assert_eq!(ceil_log2(8), Ok(3));
/// assert!(ceil_log2(0).is_err());
/// ```
pub fn ceil_log2(value: usize) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::new(
            "cannot take the log of a non-positive number: 0",
        ));
    }
    if value > 1usize << MAX_LOG_NUM_BUCKETS {
        return Err(ConfigError::new(format!(
            "{} exceeds the maximum of 2^{}",
            value, MAX_LOG_NUM_BUCKETS
        )));
    }
    Ok(value.next_power_of_two().trailing_zeros())
}

/// What a resize check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    /// Keep the current bucket array.
    Keep,
    /// Rebuild with `2^log` buckets, more than now (or as many, when the
    /// factor is 1).
    Grow(u32),
    /// Rebuild with `2^log` buckets, fewer than now.
    Shrink(u32),
}

/// Thresholds and hysteresis counters for one bucket array.
#[derive(Debug, Clone)]
pub struct ResizePolicy {
    log_min_num_buckets: u32,
    log_bin_count_factor: u32,
    bottom_threshold: usize,
    top_threshold: usize,
    over_threshold: u32,
    under_threshold: u32,
    enabled: bool,
}

impl ResizePolicy {
    /// Creates a policy; both arguments are exponents of two.
    pub fn new(log_min_num_buckets: u32, log_bin_count_factor: u32) -> Self {
        let mut policy = Self {
            log_min_num_buckets: log_min_num_buckets.min(MAX_LOG_NUM_BUCKETS),
            log_bin_count_factor: log_bin_count_factor.min(MAX_LOG_NUM_BUCKETS),
            bottom_threshold: 0,
            top_threshold: 0,
            over_threshold: 0,
            under_threshold: 0,
            enabled: true,
        };
        policy.reset(policy.log_min_num_buckets);
        policy
    }

    /// Returns `log2` of the smallest allowed bucket count.
    #[inline]
    pub fn log_min_num_buckets(&self) -> u32 {
        self.log_min_num_buckets
    }

    /// Returns `log2` of the resize factor.
    #[inline]
    pub fn log_bin_count_factor(&self) -> u32 {
        self.log_bin_count_factor
    }

    /// Size below which shrink observations count.
    #[inline]
    pub fn bottom_threshold(&self) -> usize {
        self.bottom_threshold
    }

    /// Size above which growth observations count.
    #[inline]
    pub fn top_threshold(&self) -> usize {
        self.top_threshold
    }

    /// Returns `true` if resize checks run.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables resize checks without touching thresholds.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Re-derives thresholds for `2^log_num_buckets` buckets and zeroes
    /// both counters.
    pub fn reset(&mut self, log_num_buckets: u32) {
        let num_buckets = 1usize << log_num_buckets;
        self.bottom_threshold = num_buckets >> self.log_bin_count_factor;
        self.top_threshold = num_buckets
            .checked_shl(self.log_bin_count_factor)
            .unwrap_or(usize::MAX);
        self.over_threshold = 0;
        self.under_threshold = 0;
    }

    /// Observes the size right after an insert.
    pub fn after_insert(&mut self, len: usize, log_num_buckets: u32) -> ResizeDecision {
        if !self.enabled {
            return ResizeDecision::Keep;
        }
        if len > self.top_threshold {
            self.over_threshold += 1;
        } else {
            self.over_threshold = 0;
        }
        if self.over_threshold <= RESIZE_LAG {
            return ResizeDecision::Keep;
        }
        self.over_threshold = 0;
        let log_new = log_num_buckets + self.log_bin_count_factor;
        if log_new > MAX_LOG_NUM_BUCKETS {
            return ResizeDecision::Keep;
        }
        // With a factor of 1 this rebuilds at the same size, which still
        // re-tunes the bin width.
        ResizeDecision::Grow(log_new)
    }

    /// Observes the size right after a successful take or remove.
    pub fn after_removal(&mut self, len: usize, log_num_buckets: u32) -> ResizeDecision {
        if !self.enabled {
            return ResizeDecision::Keep;
        }
        if len < self.bottom_threshold {
            self.under_threshold += 1;
        } else {
            self.under_threshold = 0;
        }
        if self.under_threshold <= RESIZE_LAG {
            return ResizeDecision::Keep;
        }
        self.under_threshold = 0;
        match log_num_buckets.checked_sub(self.log_bin_count_factor) {
            Some(log_new) if log_new > self.log_min_num_buckets => ResizeDecision::Shrink(log_new),
            _ => ResizeDecision::Keep,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_counters(&self) -> (u32, u32) {
        (self.over_threshold, self.under_threshold)
    }
}
