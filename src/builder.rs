//! Calendar queue builder.
//!
//! Collects sizing options and debug listeners, then creates a
//! [`CalendarQueue`] around a comparator.
//!
//! ## Example
//!
//! ```rust
//! use calqueue::builder::CalendarQueueBuilder;
//! use calqueue::comparator::F64Comparator;
//!
//! let mut queue = CalendarQueueBuilder::new()
//!     .min_num_buckets(16)
//!     .bin_count_factor(4)
//!     .try_build(F64Comparator::new())
//!     .unwrap();
//! queue.put(0.5);
//! assert_eq!(queue.bucket_count(), 16);
//! assert_eq!(queue.take(), Ok(0.5));
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use crate::debug::{DebugListener, DebugListeners};
use crate::error::ConfigError;
use crate::policy::resize::{MAX_LOG_NUM_BUCKETS, ResizePolicy, ceil_log2};
use crate::queue::{CalendarQueue, DEFAULT_BIN_COUNT_FACTOR, DEFAULT_MIN_NUM_BUCKETS};
use crate::traits::CqComparator;

/// Builder for [`CalendarQueue`].
#[derive(Debug, Clone)]
pub struct CalendarQueueBuilder {
    min_num_buckets: usize,
    bin_count_factor: usize,
    adaptive: bool,
    listeners: DebugListeners,
}

impl Default for CalendarQueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarQueueBuilder {
    /// Starts from 2 minimum buckets, a factor of 2, adaptive resizing.
    pub fn new() -> Self {
        Self {
            min_num_buckets: DEFAULT_MIN_NUM_BUCKETS,
            bin_count_factor: DEFAULT_BIN_COUNT_FACTOR,
            adaptive: true,
            listeners: DebugListeners::new(),
        }
    }

    /// Smallest bucket count; rounded up to a power of two.
    pub fn min_num_buckets(mut self, min_num_buckets: usize) -> Self {
        self.min_num_buckets = min_num_buckets;
        self
    }

    /// Grow/shrink factor; rounded up to a power of two. A factor of 1
    /// keeps the bucket count fixed, but the calendar is still rebuilt in
    /// place to re-tune the bin width.
    pub fn bin_count_factor(mut self, bin_count_factor: usize) -> Self {
        self.bin_count_factor = bin_count_factor;
        self
    }

    /// Whether the bucket count follows the queue size.
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Registers a debug listener on the built queue.
    pub fn debug_listener(mut self, listener: Arc<dyn DebugListener>) -> Self {
        self.listeners.add(listener);
        self
    }

    /// Builds the queue, rejecting invalid sizes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `min_num_buckets` or `bin_count_factor` is
    /// 0 or exceeds `2^30`.
    pub fn try_build<T, C>(self, comparator: C) -> Result<CalendarQueue<T, C>, ConfigError>
    where
        T: Clone + Debug,
        C: CqComparator<T>,
    {
        if self.min_num_buckets == 0 {
            return Err(ConfigError::new("min_num_buckets must be > 0"));
        }
        if self.bin_count_factor == 0 {
            return Err(ConfigError::new("bin_count_factor must be > 0"));
        }
        let log_min = ceil_log2(self.min_num_buckets)
            .map_err(|err| ConfigError::new(format!("min_num_buckets: {}", err)))?;
        let log_factor = ceil_log2(self.bin_count_factor)
            .map_err(|err| ConfigError::new(format!("bin_count_factor: {}", err)))?;
        Ok(self.assemble(comparator, log_min, log_factor))
    }

    /// Builds the queue, clamping out-of-range sizes into `1..=2^30`.
    pub fn build<T, C>(self, comparator: C) -> CalendarQueue<T, C>
    where
        T: Clone + Debug,
        C: CqComparator<T>,
    {
        let log_min = ceil_log2(self.min_num_buckets.max(1)).unwrap_or(MAX_LOG_NUM_BUCKETS);
        let log_factor = ceil_log2(self.bin_count_factor.max(1)).unwrap_or(MAX_LOG_NUM_BUCKETS);
        self.assemble(comparator, log_min, log_factor)
    }

    fn assemble<T, C>(self, comparator: C, log_min: u32, log_factor: u32) -> CalendarQueue<T, C> {
        let mut queue = CalendarQueue::from_policy(comparator, ResizePolicy::new(log_min, log_factor));
        queue.set_adaptive(self.adaptive);
        queue.set_listeners(self.listeners);
        queue
    }
}
