//! Adaptive calendar queue.
//!
//! A priority queue for discrete-event scheduling with amortized O(1)
//! enqueue and dequeue. Entries land in a virtual timeline of fixed-width
//! bins supplied by a [`CqComparator`]; virtual bins fold onto a power-of-two
//! array of sorted buckets, like days of a year onto a desk calendar.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        CalendarQueue<T, C> Layout                           │
//! │                                                                             │
//! │   ┌──────────────┐   compare / virtual_bin_number / set_zero_reference      │
//! │   │ comparator C │◄─────────────────────────────────────┐ set_bin_width    │
//! │   └──────────────┘                                      │                   │
//! │                                                         │                   │
//! │   calendar: Option<BucketArray<T>>   None until the first put               │
//! │   ┌─────────┬─────────┬─────────┬─────────┐                                 │
//! │   │ [1, 1]  │ [5]     │ []      │ [3, 7]  │   vbin & (n - 1)                │
//! │   └─────────┴─────────┴─────────┴─────────┘                                 │
//! │                                                         │                   │
//! │   policy: ResizePolicy     grow/shrink after 32 consecutive crossings       │
//! │   samples: SampleRing<T, 8> recent dequeues, strictly increasing ──────────┘│
//! │   cached_minimum: Option<usize>   set by get(), cleared by any mutation     │
//! │   listeners: DebugListeners                                                 │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   Uninitialized ──put──► Initialized ──clear──► Uninitialized
//!                           │      ▲
//!                           └resize┘  (rebuild at 2^k', re-tuned bin width)
//! ```
//!
//! The first put after construction or [`clear`](CalendarQueue::clear) sets
//! the comparator's zero reference to that entry and resets its bin width.
//!
//! ## Operations
//!
//! | Operation          | Description                                  | Complexity     |
//! |--------------------|----------------------------------------------|----------------|
//! | [`put`]            | Insert, FIFO among equal entries             | O(1) amortized |
//! | [`take`]           | Remove and return the smallest entry         | O(1) amortized |
//! | [`get`]            | Peek at the smallest entry (cached)          | O(1) amortized |
//! | [`remove`]         | Remove an entry equal to the argument        | O(bucket len)  |
//! | [`contains`]       | Membership by equality                       | O(bucket len)  |
//! | [`to_vec_limit`]   | Smallest `limit` entries in order            | O(n + buckets) |
//! | [`clear`]          | Drop everything, return to uninitialized     | O(n)           |
//!
//! [`put`]: CalendarQueue::put
//! [`take`]: CalendarQueue::take
//! [`get`]: CalendarQueue::get
//! [`remove`]: CalendarQueue::remove
//! [`contains`]: CalendarQueue::contains
//! [`to_vec_limit`]: CalendarQueue::to_vec_limit
//! [`clear`]: CalendarQueue::clear
//!
//! ## Example Usage
//!
//! ```
//! use calqueue::comparator::F64Comparator;
//! use calqueue::queue::CalendarQueue;
//!
//! let mut queue = CalendarQueue::new(F64Comparator::new());
//! for t in [5.0, 1.0, 3.0, 1.0, 9.0] {
//!     queue.put(t);
//! }
//!
//! assert_eq!(queue.len(), 5);
//! assert_eq!(queue.get(), Ok(&1.0));
//! assert_eq!(queue.to_vec_limit(3), Ok(vec![1.0, 1.0, 3.0]));
//!
//! let drained: Vec<f64> = std::iter::from_fn(|| queue.take().ok()).collect();
//! assert_eq!(drained, vec![1.0, 1.0, 3.0, 5.0, 9.0]);
//! ```
//!
//! ## Thread Safety
//!
//! `CalendarQueue` is not thread-safe; mutation requires `&mut self`. Enable
//! the `concurrency` feature for [`ConcurrentCalendarQueue`], which
//! serializes every call behind a mutex.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::debug::{DebugListener, DebugListeners};
use crate::ds::{BucketArray, SampleRing};
use crate::error::{ConfigError, InvariantError, QueueError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CalendarQueueMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CalendarQueueMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CalendarMetricsReadRecorder, CalendarMetricsRecorder, MetricsSnapshotProvider,
};
use crate::policy::resize::{MAX_LOG_NUM_BUCKETS, ResizeDecision, ResizePolicy, ceil_log2};
use crate::traits::CqComparator;

/// Entries kept for bin-width re-tuning.
pub const SAMPLE_SIZE: usize = 8;

/// Default smallest bucket count.
pub const DEFAULT_MIN_NUM_BUCKETS: usize = 2;

/// Default grow/shrink factor.
pub const DEFAULT_BIN_COUNT_FACTOR: usize = 2;

fn missing_calendar() -> InvariantError {
    InvariantError::new("queue holds entries but has no bucket array")
}

/// Records `entry` if it is strictly greater than the last sample.
fn record_sample<T, C>(samples: &mut SampleRing<T, SAMPLE_SIZE>, cmp: &C, entry: &T)
where
    T: Clone,
    C: CqComparator<T>,
{
    let newer = samples
        .most_recent()
        .is_none_or(|last| cmp.compare(entry, last) == Ordering::Greater);
    if newer {
        samples.record(entry.clone());
    }
}

/// Priority queue over a self-resizing calendar of sorted buckets.
///
/// Entries that compare equal dequeue in insertion order.
pub struct CalendarQueue<T, C> {
    comparator: C,
    calendar: Option<BucketArray<T>>,
    policy: ResizePolicy,
    samples: SampleRing<T, SAMPLE_SIZE>,
    len: usize,
    cached_minimum: Option<usize>,
    listeners: DebugListeners,
    #[cfg(feature = "metrics")]
    metrics: CalendarQueueMetrics,
}

impl<T, C> CalendarQueue<T, C> {
    /// Creates a queue with 2 minimum buckets, a factor of 2, and adaptive
    /// resizing.
    pub fn new(comparator: C) -> Self {
        Self::with_buckets(comparator, DEFAULT_MIN_NUM_BUCKETS, DEFAULT_BIN_COUNT_FACTOR)
    }

    /// Creates a queue with the given minimum bucket count and resize
    /// factor. Both are rounded up to powers of two; zero is treated as 1
    /// and values above `2^30` as `2^30`.
    pub fn with_buckets(comparator: C, min_num_buckets: usize, bin_count_factor: usize) -> Self {
        let log_min = ceil_log2(min_num_buckets.max(1)).unwrap_or(MAX_LOG_NUM_BUCKETS);
        let log_factor = ceil_log2(bin_count_factor.max(1)).unwrap_or(MAX_LOG_NUM_BUCKETS);
        Self::from_policy(comparator, ResizePolicy::new(log_min, log_factor))
    }

    /// Like [`with_buckets`](Self::with_buckets) but rejects zero or
    /// oversized arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either argument is 0 or exceeds `2^30`.
    pub fn try_with_buckets(
        comparator: C,
        min_num_buckets: usize,
        bin_count_factor: usize,
    ) -> Result<Self, ConfigError> {
        let log_min = ceil_log2(min_num_buckets)
            .map_err(|err| ConfigError::new(format!("min_num_buckets: {}", err)))?;
        let log_factor = ceil_log2(bin_count_factor)
            .map_err(|err| ConfigError::new(format!("bin_count_factor: {}", err)))?;
        Ok(Self::from_policy(comparator, ResizePolicy::new(log_min, log_factor)))
    }

    pub(crate) fn from_policy(comparator: C, policy: ResizePolicy) -> Self {
        Self {
            comparator,
            calendar: None,
            policy,
            samples: SampleRing::new(),
            len: 0,
            cached_minimum: None,
            listeners: DebugListeners::new(),
            #[cfg(feature = "metrics")]
            metrics: CalendarQueueMetrics::default(),
        }
    }

    /// Number of queued entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no entries are queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of physical buckets.
    ///
    /// Before the first put this is the count the queue will start with.
    pub fn bucket_count(&self) -> usize {
        1usize << self.log_bucket_count()
    }

    /// `log2` of [`bucket_count`](Self::bucket_count).
    pub fn log_bucket_count(&self) -> u32 {
        self.calendar
            .as_ref()
            .map_or(self.policy.log_min_num_buckets(), BucketArray::log_len)
    }

    /// Smallest bucket count the queue will shrink towards.
    pub fn min_num_buckets(&self) -> usize {
        1usize << self.policy.log_min_num_buckets()
    }

    /// Factor by which the bucket count grows or shrinks.
    pub fn bin_count_factor(&self) -> usize {
        1usize << self.policy.log_bin_count_factor()
    }

    /// Returns `true` if the bucket count follows the queue size.
    pub fn is_adaptive(&self) -> bool {
        self.policy.is_enabled()
    }

    /// Enables or disables resizing. The current bucket count is kept.
    pub fn set_adaptive(&mut self, adaptive: bool) {
        self.policy.set_enabled(adaptive);
    }

    /// The comparator.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Mutable access to the comparator.
    ///
    /// Changing how queued entries project onto virtual bins leaves them in
    /// the wrong buckets; [`check_invariants`](Self::check_invariants)
    /// reports that.
    pub fn comparator_mut(&mut self) -> &mut C {
        self.cached_minimum = None;
        &mut self.comparator
    }

    /// Consumes the queue and returns its comparator.
    pub fn into_comparator(self) -> C {
        self.comparator
    }

    /// Registers a debug listener. Returns `false` if this exact listener
    /// is already registered.
    pub fn add_debug_listener(&mut self, listener: Arc<dyn DebugListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Unregisters a debug listener. Returns `false` if it was not
    /// registered.
    pub fn remove_debug_listener(&mut self, listener: &Arc<dyn DebugListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub(crate) fn set_listeners(&mut self, listeners: DebugListeners) {
        self.listeners = listeners;
    }

    /// Removes every entry and returns to the uninitialized state.
    ///
    /// The next put re-anchors the comparator. Samples are discarded.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        self.calendar = None;
        self.len = 0;
        self.cached_minimum = None;
        self.samples.clear();
        self.policy.reset(self.policy.log_min_num_buckets());
        trace!("cleared calendar queue");
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.calendar.as_ref().map_or(0, BucketArray::approx_bytes)
            + self.samples.capacity() * std::mem::size_of::<T>()
    }

    fn resize_after_insert(&mut self)
    where
        T: Clone + fmt::Debug,
        C: CqComparator<T>,
    {
        let Some(log) = self.calendar.as_ref().map(BucketArray::log_len) else {
            return;
        };
        let decision = self.policy.after_insert(self.len, log);
        self.apply_resize(decision);
    }

    fn resize_after_removal(&mut self)
    where
        T: Clone + fmt::Debug,
        C: CqComparator<T>,
    {
        let Some(log) = self.calendar.as_ref().map(BucketArray::log_len) else {
            return;
        };
        let decision = self.policy.after_removal(self.len, log);
        self.apply_resize(decision);
    }

    fn apply_resize(&mut self, decision: ResizeDecision)
    where
        T: Clone + fmt::Debug,
        C: CqComparator<T>,
    {
        let log_num_buckets = match decision {
            ResizeDecision::Keep => return,
            ResizeDecision::Grow(log) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_grow();
                self.listeners.notify(format_args!(
                    ">>>>>> increasing number of buckets to: {}",
                    1usize << log
                ));
                debug!(buckets = 1usize << log, len = self.len, "growing calendar");
                log
            },
            ResizeDecision::Shrink(log) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_shrink();
                self.listeners.notify(format_args!(
                    ">>>>>> decreasing number of buckets to: {}",
                    1usize << log
                ));
                debug!(buckets = 1usize << log, len = self.len, "shrinking calendar");
                log
            },
        };
        self.rebucket(log_num_buckets);
    }

    /// Rebuilds the calendar with `2^log_num_buckets` buckets.
    ///
    /// Re-tunes the bin width first if a full sample is available. Entries
    /// are moved, never cloned, and reinserting them neither notifies
    /// listeners nor triggers another resize.
    fn rebucket(&mut self, log_num_buckets: u32)
    where
        T: Clone,
        C: CqComparator<T>,
    {
        let Some(old) = self.calendar.take() else {
            return;
        };

        if self.samples.is_full() {
            let sample = self.samples.make_chronological();
            self.comparator.set_bin_width(Some(sample));
            #[cfg(feature = "metrics")]
            self.metrics.record_bin_width_update();
            self.listeners.notify(format_args!(">>> changing bin width."));
            debug!(samples = SAMPLE_SIZE, "re-tuned bin width");
        }

        let (old_buckets, anchor) = old.into_parts();
        let mut calendar = BucketArray::new(log_num_buckets, anchor, &self.comparator);
        let mut moved = 0usize;
        for mut bucket in old_buckets {
            while let Some(entry) = bucket.take_first() {
                calendar.insert(entry, moved == 0, &self.comparator);
                moved += 1;
            }
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_rebucketed_entries(moved);

        self.policy.reset(log_num_buckets);
        self.calendar = Some(calendar);
        self.cached_minimum = None;
    }
}

impl<T, C> CalendarQueue<T, C>
where
    T: Clone + fmt::Debug,
    C: CqComparator<T>,
{
    /// Inserts `entry`. Always returns `true`.
    ///
    /// On an uninitialized queue the comparator is first anchored at
    /// `entry` and reset to its default bin width.
    pub fn put(&mut self, entry: T) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_put_call();

        self.listeners
            .notify(format_args!("+++ putting in queue: {:?}", entry));

        if self.calendar.is_none() {
            self.initialize(&entry);
        }
        if let Some(calendar) = self.calendar.as_mut() {
            calendar.insert(entry, self.len == 0, &self.comparator);
            self.len += 1;
        }
        self.cached_minimum = None;
        trace!(len = self.len, "put");

        self.resize_after_insert();
        true
    }

    fn initialize(&mut self, first: &T) {
        self.comparator.set_zero_reference(first);
        self.comparator.set_bin_width(None);
        self.len = 0;
        let log = self.policy.log_min_num_buckets();
        self.calendar = Some(BucketArray::new(log, first.clone(), &self.comparator));
        self.policy.reset(log);
        self.samples.clear();
        debug!(buckets = 1usize << log, "initialized calendar");
    }

    fn minimum_bucket_index(&mut self) -> Result<usize, QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        if let Some(index) = self.cached_minimum {
            return Ok(index);
        }
        let calendar = self.calendar.as_ref().ok_or_else(missing_calendar)?;
        let found = calendar.find_minimum_bucket(&self.comparator)?;

        #[cfg(feature = "metrics")]
        self.metrics.record_min_search(found.steps, found.exact);

        self.cached_minimum = Some(found.index);
        Ok(found.index)
    }

    /// Removes and returns the smallest entry; among equal entries, the
    /// one put first.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] if the queue is empty (state is unchanged);
    /// [`QueueError::Corrupted`] if the bucket bookkeeping is inconsistent.
    pub fn take(&mut self) -> Result<T, QueueError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_take_call();

        let index = match self.minimum_bucket_index() {
            Ok(index) => index,
            Err(err) => {
                #[cfg(feature = "metrics")]
                if err.is_empty() {
                    self.metrics.record_take_empty();
                }
                return Err(err);
            },
        };
        let calendar = self.calendar.as_mut().ok_or_else(missing_calendar)?;
        let entry = calendar
            .take_from(index, &self.comparator)
            .ok_or_else(|| InvariantError::new(format!("minimum bucket {} is empty", index)))?;
        self.len -= 1;
        self.cached_minimum = None;

        record_sample(&mut self.samples, &self.comparator, &entry);
        self.listeners
            .notify(format_args!("--- taking from queue: {:?}", entry));
        trace!(len = self.len, "take");

        self.resize_after_removal();
        Ok(entry)
    }

    /// Returns the entry the next [`take`](Self::take) would return.
    ///
    /// Repeated calls without an intervening mutation hit a cache and do
    /// not rescan, sample or notify.
    ///
    /// # Errors
    ///
    /// Same as [`take`](Self::take).
    pub fn get(&mut self) -> Result<&T, QueueError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_get_call();

        let cached = self.cached_minimum.is_some();
        let index = self.minimum_bucket_index()?;
        let head = self
            .calendar
            .as_ref()
            .and_then(|calendar| calendar.head(index))
            .ok_or_else(|| InvariantError::new(format!("minimum bucket {} is empty", index)))?;

        if cached {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_cache_hit();
        } else {
            record_sample(&mut self.samples, &self.comparator, head);
            self.listeners
                .notify(format_args!("--- getting from queue: {:?}", head));
        }
        Ok(head)
    }

    /// Removes the first entry equal to `entry` and returns it.
    ///
    /// Only the bucket `entry` itself maps to is searched, so an equal
    /// entry with a different virtual bin number is not found.
    pub fn remove(&mut self, entry: &T) -> Option<T>
    where
        T: PartialEq,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        if self.len == 0 {
            return None;
        }
        let removed = self.calendar.as_mut()?.remove(entry, &self.comparator)?;

        #[cfg(feature = "metrics")]
        self.metrics.record_remove_found();

        self.len -= 1;
        self.cached_minimum = None;
        self.listeners
            .notify(format_args!("--- removing from queue: {:?}", removed));
        trace!(len = self.len, "remove");

        self.resize_after_removal();
        Some(removed)
    }

    /// Returns `true` if an entry equal to `entry` is queued in the bucket
    /// `entry` maps to.
    pub fn contains(&self, entry: &T) -> bool
    where
        T: PartialEq,
    {
        #[cfg(feature = "metrics")]
        (&self.metrics).record_contains_call();

        let found = self.len > 0
            && self
                .calendar
                .as_ref()
                .is_some_and(|calendar| calendar.contains(entry, &self.comparator));

        #[cfg(feature = "metrics")]
        if found {
            (&self.metrics).record_contains_found();
        }
        found
    }

    /// Returns the smallest `min(limit, len)` entries in dequeue order.
    ///
    /// Nothing is removed, sampled or cached.
    ///
    /// # Errors
    ///
    /// [`QueueError::Corrupted`] if the walk runs out of entries early.
    pub fn to_vec_limit(&self, limit: usize) -> Result<Vec<T>, QueueError> {
        #[cfg(feature = "metrics")]
        (&self.metrics).record_to_vec_call();

        if self.len == 0 {
            return Ok(Vec::new());
        }
        let calendar = self.calendar.as_ref().ok_or_else(missing_calendar)?;
        let entries = calendar.collect_ordered(limit.min(self.len), &self.comparator)?;
        Ok(entries.into_iter().cloned().collect())
    }

    /// Returns every entry in dequeue order.
    ///
    /// # Errors
    ///
    /// Same as [`to_vec_limit`](Self::to_vec_limit).
    pub fn to_vec(&self) -> Result<Vec<T>, QueueError> {
        self.to_vec_limit(self.len)
    }

    /// Verifies the structure against the recorded size.
    ///
    /// Checks that every entry sits in the bucket its virtual bin maps to,
    /// that buckets are sorted, that bucket lengths add up to `len`, and
    /// that the tracked minimum does not lie past the smallest entry.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let Some(calendar) = self.calendar.as_ref() else {
            if self.len != 0 {
                return Err(missing_calendar());
            }
            return Ok(());
        };

        let counted = calendar.check(&self.comparator)?;
        if counted != self.len {
            return Err(InvariantError::new(format!(
                "buckets hold {} entries but len is {}",
                counted, self.len
            )));
        }
        if calendar.log_len() < self.policy.log_min_num_buckets() {
            return Err(InvariantError::new(format!(
                "{} buckets is below the minimum of {}",
                calendar.len(),
                self.min_num_buckets()
            )));
        }
        if self.len == 0 {
            return Ok(());
        }

        let found = calendar.find_minimum_bucket(&self.comparator)?;
        let smallest = calendar
            .head(found.index)
            .ok_or_else(|| InvariantError::new("minimum search returned an empty bucket"))?;
        if self.comparator.virtual_bin_number(smallest) < calendar.min_virtual_bucket() {
            return Err(InvariantError::new(
                "smallest entry lies before the tracked minimum bin",
            ));
        }
        if let Some(cached) = self.cached_minimum {
            let cached_head = calendar
                .head(cached)
                .ok_or_else(|| InvariantError::new("cached minimum bucket is empty"))?;
            if self.comparator.compare(cached_head, smallest) != Ordering::Equal {
                return Err(InvariantError::new("cached minimum is stale"));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Some(calendar) = self.calendar.as_ref() {
            calendar.debug_validate_invariants();
        }
        self.samples.debug_validate_invariants();
        if let Err(err) = self.check_invariants() {
            panic!("calendar queue invariant violated: {}", err);
        }
    }
}

#[cfg(feature = "metrics")]
impl<T, C> CalendarQueue<T, C> {
    pub fn metrics_snapshot(&self) -> CalendarQueueMetricsSnapshot {
        self.metrics.snapshot(self.len, self.bucket_count())
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

#[cfg(feature = "metrics")]
impl<T, C> MetricsSnapshotProvider<CalendarQueueMetricsSnapshot> for CalendarQueue<T, C> {
    fn snapshot(&self) -> CalendarQueueMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<T, C> fmt::Debug for CalendarQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarQueue")
            .field("len", &self.len)
            .field("bucket_count", &self.bucket_count())
            .field("adaptive", &self.is_adaptive())
            .finish_non_exhaustive()
    }
}

impl<T, C: Default> Default for CalendarQueue<T, C> {
    /// Creates a queue with default sizing and a default comparator.
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<T, C> Extend<T> for CalendarQueue<T, C>
where
    T: Clone + fmt::Debug,
    C: CqComparator<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entry in iter {
            self.put(entry);
        }
    }
}

// Send + Sync analysis:
// - CalendarQueue is Send if T and C are Send (listeners are Send + Sync)
// - CalendarQueue is Sync if T and C are Sync; the `&self` metrics counters
//   are atomic
// - Thread safety for shared mutation is provided by ConcurrentCalendarQueue

/// Thread-safe calendar queue wrapper using a mutex.
///
/// Every call takes the lock, so operations are linearizable. Peeking hands
/// a closure the smallest entry instead of returning a reference.
#[cfg(feature = "concurrency")]
pub struct ConcurrentCalendarQueue<T, C> {
    inner: Arc<Mutex<CalendarQueue<T, C>>>,
}

#[cfg(feature = "concurrency")]
impl<T, C> Clone for ConcurrentCalendarQueue<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<T, C> fmt::Debug for ConcurrentCalendarQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.lock();
        f.debug_struct("ConcurrentCalendarQueue")
            .field("len", &queue.len())
            .field("bucket_count", &queue.bucket_count())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<T, C> From<CalendarQueue<T, C>> for ConcurrentCalendarQueue<T, C> {
    fn from(queue: CalendarQueue<T, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<T, C> ConcurrentCalendarQueue<T, C>
where
    T: Clone + fmt::Debug + Send,
    C: CqComparator<T> + Send,
{
    /// Creates a shared queue with default sizing.
    ///
    /// ```
    /// use calqueue::comparator::F64Comparator;
    /// use calqueue::queue::ConcurrentCalendarQueue;
    ///
    /// let queue = ConcurrentCalendarQueue::new(F64Comparator::new());
    /// let producer = queue.clone();
    /// std::thread::spawn(move || {
    ///     producer.put(2.0);
    ///     producer.put(1.0);
    /// })
    /// .join()
    /// .unwrap();
    ///
    /// assert_eq!(queue.get_with(|e| *e), Ok(1.0));
    /// assert_eq!(queue.take(), Ok(1.0));
    /// ```
    pub fn new(comparator: C) -> Self {
        CalendarQueue::new(comparator).into()
    }

    pub fn put(&self, entry: T) -> bool {
        self.inner.lock().put(entry)
    }

    pub fn take(&self) -> Result<T, QueueError> {
        self.inner.lock().take()
    }

    /// Applies `f` to the smallest entry under the lock.
    pub fn get_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, QueueError> {
        let mut queue = self.inner.lock();
        queue.get().map(f)
    }

    pub fn remove(&self, entry: &T) -> Option<T>
    where
        T: PartialEq,
    {
        self.inner.lock().remove(entry)
    }

    pub fn contains(&self, entry: &T) -> bool
    where
        T: PartialEq,
    {
        self.inner.lock().contains(entry)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn set_adaptive(&self, adaptive: bool) {
        self.inner.lock().set_adaptive(adaptive);
    }

    pub fn bucket_count(&self) -> usize {
        self.inner.lock().bucket_count()
    }

    pub fn to_vec(&self) -> Result<Vec<T>, QueueError> {
        self.inner.lock().to_vec()
    }

    pub fn to_vec_limit(&self, limit: usize) -> Result<Vec<T>, QueueError> {
        self.inner.lock().to_vec_limit(limit)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}

#[cfg(all(feature = "metrics", feature = "concurrency"))]
impl<T, C> ConcurrentCalendarQueue<T, C> {
    pub fn metrics_snapshot(&self) -> CalendarQueueMetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

#[cfg(all(feature = "metrics", feature = "concurrency"))]
impl<T, C> MetricsSnapshotProvider<CalendarQueueMetricsSnapshot>
    for ConcurrentCalendarQueue<T, C>
{
    fn snapshot(&self) -> CalendarQueueMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{F64Comparator, KeyedComparator};
    use crate::debug::RecorderListener;
    use crate::policy::resize::RESIZE_LAG;

    type Entry = (i64, u64);
    type Keyed = KeyedComparator<Entry, fn(&Entry) -> i64>;

    fn key_of(entry: &Entry) -> i64 {
        entry.0
    }

    fn keyed_queue() -> CalendarQueue<Entry, Keyed> {
        CalendarQueue::new(KeyedComparator::new(key_of as fn(&Entry) -> i64))
    }

    fn drain<T: Clone + fmt::Debug, C: CqComparator<T>>(queue: &mut CalendarQueue<T, C>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(entry) = queue.take() {
            queue.debug_validate_invariants();
            out.push(entry);
        }
        out
    }

    // ==============================================
    // CORRECTNESS TESTS MODULE
    // ==============================================
    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn test_new_queue_is_uninitialized() {
                let queue: CalendarQueue<f64, _> = CalendarQueue::new(F64Comparator::new());
                assert!(queue.is_empty());
                assert_eq!(queue.len(), 0);
                assert_eq!(queue.bucket_count(), 2);
                assert_eq!(queue.min_num_buckets(), 2);
                assert_eq!(queue.bin_count_factor(), 2);
                assert!(queue.is_adaptive());
                assert!(queue.calendar.is_none());
                queue.debug_validate_invariants();
            }

            #[test]
            fn test_take_orders_with_fifo_ties() {
                let mut queue = keyed_queue();
                for (seq, key) in [5, 1, 3, 1, 9].into_iter().enumerate() {
                    assert!(queue.put((key, seq as u64)));
                }
                assert_eq!(queue.len(), 5);
                assert_eq!(drain(&mut queue), vec![(1, 1), (1, 3), (3, 2), (5, 0), (9, 4)]);
                assert!(queue.is_empty());
            }

            #[test]
            fn test_take_on_empty_leaves_state_untouched() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                assert_eq!(queue.take(), Err(QueueError::Empty));
                assert_eq!(queue.get(), Err(QueueError::Empty));
                assert!(queue.calendar.is_none());

                queue.put(4.0);
                queue.take().unwrap();
                assert_eq!(queue.take(), Err(QueueError::Empty));
                assert_eq!(queue.len(), 0);
                queue.debug_validate_invariants();
            }

            #[test]
            fn test_to_vec_reaches_infinity_past_a_distant_entry() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([0.0, 1e12, f64::INFINITY]);
                assert_eq!(queue.to_vec_limit(3), Ok(vec![0.0, 1e12, f64::INFINITY]));
                assert_eq!(queue.to_vec_limit(2), Ok(vec![0.0, 1e12]));
            }

            #[test]
            fn test_nan_drains_after_every_number() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([0.0, f64::NAN, 1.0, -f64::NAN, f64::INFINITY, 1e15]);

                let drained = drain(&mut queue);
                assert_eq!(drained.len(), 6);
                assert!(drained[0].is_nan() && drained[0].is_sign_negative());
                assert_eq!(&drained[1..5], &[0.0, 1.0, 1e15, f64::INFINITY]);
                assert!(drained[5].is_nan() && drained[5].is_sign_positive());
            }

            #[test]
            fn test_get_is_idempotent_and_samples_once() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([3.0, 1.0, 2.0]);

                assert_eq!(queue.get(), Ok(&1.0));
                assert_eq!(queue.get(), Ok(&1.0));
                assert_eq!(queue.samples.len(), 1);
                assert_eq!(queue.len(), 3);

                assert_eq!(queue.take(), Ok(1.0));
                // Equal to the last sample, so not recorded again.
                assert_eq!(queue.samples.len(), 1);
                assert_eq!(queue.get(), Ok(&2.0));
                assert_eq!(queue.samples.len(), 2);
            }

            #[test]
            fn test_put_after_get_invalidates_cache() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.put(5.0);
                assert_eq!(queue.get(), Ok(&5.0));
                queue.put(2.0);
                assert_eq!(queue.get(), Ok(&2.0));
                assert_eq!(queue.take(), Ok(2.0));
                assert_eq!(queue.get(), Ok(&5.0));
            }

            #[test]
            fn test_first_put_anchors_comparator() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.put(42.0);
                assert_eq!(queue.comparator().zero_reference(), 42.0);
                queue.put(7.0);
                assert_eq!(queue.comparator().zero_reference(), 42.0);
                assert_eq!(queue.take(), Ok(7.0));
            }

            #[test]
            fn test_clear_reinitializes_on_next_put() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([1.0, 2.0, 3.0]);
                queue.take().unwrap();
                queue.clear();
                assert!(queue.is_empty());
                assert!(queue.samples.is_empty());
                assert_eq!(queue.take(), Err(QueueError::Empty));

                queue.put(100.0);
                assert_eq!(queue.comparator().zero_reference(), 100.0);
                assert_eq!(queue.take(), Ok(100.0));
            }

            #[test]
            fn test_negative_and_far_future_entries() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([0.0, -5.5, 1e12, -1e9, 3.25]);
                assert_eq!(drain(&mut queue), vec![-1e9, -5.5, 0.0, 3.25, 1e12]);
            }
        }

        mod removal {
            use super::*;

            #[test]
            fn test_remove_present_and_absent() {
                let mut queue = keyed_queue();
                queue.extend([(4, 0), (2, 1), (4, 2)]);

                assert_eq!(queue.remove(&(4, 2)), Some((4, 2)));
                assert_eq!(queue.len(), 2);
                assert_eq!(queue.remove(&(4, 2)), None);
                assert_eq!(queue.remove(&(7, 0)), None);
                assert_eq!(queue.len(), 2);
                assert!(queue.contains(&(4, 0)));
                assert!(!queue.contains(&(4, 2)));
                queue.debug_validate_invariants();

                assert_eq!(drain(&mut queue), vec![(2, 1), (4, 0)]);
            }

            #[test]
            fn test_remove_takes_first_equal_entry() {
                let mut queue = keyed_queue();
                queue.extend([(3, 9), (3, 9), (1, 0)]);
                assert_eq!(queue.remove(&(3, 9)), Some((3, 9)));
                assert_eq!(queue.len(), 2);
                assert!(queue.contains(&(3, 9)));
            }

            #[test]
            fn test_remove_minimum_then_take() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([1.0, 2.0, 3.0]);
                assert_eq!(queue.get(), Ok(&1.0));
                assert_eq!(queue.remove(&1.0), Some(1.0));
                assert_eq!(queue.get(), Ok(&2.0));
                assert_eq!(queue.take(), Ok(2.0));
                assert_eq!(queue.take(), Ok(3.0));
            }

            #[test]
            fn test_remove_and_contains_on_empty_queue() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                assert!(!queue.contains(&1.0));
                assert_eq!(queue.remove(&1.0), None);
            }
        }

        mod ordered_snapshot {
            use super::*;

            #[test]
            fn test_to_vec_limit_is_non_destructive() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([3.0, 1.0, 2.0, 8.5]);
                assert_eq!(queue.to_vec_limit(2), Ok(vec![1.0, 2.0]));
                assert_eq!(queue.to_vec_limit(10), Ok(vec![1.0, 2.0, 3.0, 8.5]));
                assert_eq!(queue.to_vec(), Ok(vec![1.0, 2.0, 3.0, 8.5]));
                assert_eq!(queue.len(), 4);
                assert!(queue.samples.is_empty());
            }

            #[test]
            fn test_to_vec_on_empty_queue() {
                let queue: CalendarQueue<f64, _> = CalendarQueue::new(F64Comparator::new());
                assert_eq!(queue.to_vec(), Ok(vec![]));
                assert_eq!(queue.to_vec_limit(0), Ok(vec![]));
            }

            #[test]
            fn test_to_vec_keeps_fifo_ties() {
                let mut queue = keyed_queue();
                queue.extend([(2, 0), (1, 1), (2, 2), (1, 3)]);
                assert_eq!(queue.to_vec(), Ok(vec![(1, 1), (1, 3), (2, 0), (2, 2)]));
            }
        }

        mod resizing {
            use super::*;

            #[test]
            fn test_growth_with_increasing_entries() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 2);
                for i in 0..200 {
                    queue.put(i as f64);
                }
                assert!(queue.bucket_count() > 2);
                queue.debug_validate_invariants();

                let drained = drain(&mut queue);
                let expected: Vec<f64> = (0..200).map(|i| i as f64).collect();
                assert_eq!(drained, expected);
            }

            #[test]
            fn test_growth_requires_consecutive_crossings() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 2);
                // top threshold for 2 buckets is 4.
                for i in 0..(4 + RESIZE_LAG as usize) {
                    queue.put(i as f64);
                }
                assert_eq!(queue.bucket_count(), 2);
                queue.put(1000.0);
                assert_eq!(queue.bucket_count(), 4);
            }

            #[test]
            fn test_shrink_after_sustained_low_occupancy() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 2);
                for i in 0..200 {
                    queue.put(i as f64);
                }
                let peak = queue.bucket_count();
                while queue.len() > 10 {
                    queue.take().unwrap();
                }
                let mut next = 1000.0;
                for _ in 0..(2 * RESIZE_LAG) {
                    queue.put(next);
                    next += 1.0;
                    queue.take().unwrap();
                }
                assert!(queue.bucket_count() < peak);
                assert!(queue.bucket_count() > queue.min_num_buckets());
                queue.debug_validate_invariants();
            }

            #[test]
            fn test_never_shrinks_to_floor() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 4, 2);
                for i in 0..200 {
                    queue.put(i as f64);
                }
                drain(&mut queue);
                for round in 0..500 {
                    queue.put(round as f64);
                    queue.take().unwrap();
                }
                assert!(queue.bucket_count() > 4);
            }

            #[test]
            fn test_non_adaptive_queue_keeps_bucket_count() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 2);
                queue.set_adaptive(false);
                for i in 0..500 {
                    queue.put(i as f64);
                }
                assert_eq!(queue.bucket_count(), 2);
                assert!(!queue.is_adaptive());
                assert_eq!(queue.take(), Ok(0.0));
            }

            #[test]
            fn test_factor_one_keeps_bucket_count() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 8, 1);
                for i in 0..300 {
                    queue.put(i as f64);
                }
                assert_eq!(queue.bucket_count(), 8);
                assert_eq!(drain(&mut queue).len(), 300);
            }

            #[test]
            fn test_factor_one_still_retunes_bin_width() {
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 1);
                for i in 0..20 {
                    queue.put(i as f64 / 1024.0);
                }
                for _ in 0..20 {
                    queue.take().unwrap();
                }
                assert!(queue.samples.is_full());

                for i in 0..2000 {
                    queue.put(i as f64 / 1024.0);
                }
                assert_eq!(queue.bucket_count(), 2);
                assert_eq!(queue.comparator().bin_width(), 3.0 / 1024.0);

                let drained = drain(&mut queue);
                assert_eq!(drained.len(), 2000);
                assert!(drained.windows(2).all(|w| w[0] <= w[1]));
            }

            #[test]
            fn test_resize_retunes_bin_width_from_samples() {
                let recorder = Arc::new(RecorderListener::new());
                let mut queue = CalendarQueue::with_buckets(F64Comparator::new(), 2, 2);

                for i in 0..SAMPLE_SIZE {
                    queue.put(i as f64 * 0.5);
                }
                for _ in 0..SAMPLE_SIZE {
                    queue.take().unwrap();
                }
                assert!(queue.samples.is_full());

                queue.add_debug_listener(recorder.clone());
                for i in 0..200 {
                    queue.put(10.0 + i as f64);
                }

                assert_eq!(queue.comparator().bin_width(), 1.5);
                let messages = recorder.messages();
                assert!(messages.contains(&">>>>>> increasing number of buckets to: 4".to_string()));
                assert!(messages.contains(&">>> changing bin width.".to_string()));
                // Rebucketing is silent: one message per put plus resize notices.
                let puts = messages.iter().filter(|m| m.starts_with("+++")).count();
                assert_eq!(puts, 200);
                queue.debug_validate_invariants();
            }

            #[test]
            fn test_with_buckets_rounds_up() {
                let queue: CalendarQueue<f64, _> =
                    CalendarQueue::with_buckets(F64Comparator::new(), 5, 3);
                assert_eq!(queue.min_num_buckets(), 8);
                assert_eq!(queue.bin_count_factor(), 4);

                let clamped: CalendarQueue<f64, _> =
                    CalendarQueue::with_buckets(F64Comparator::new(), 0, 0);
                assert_eq!(clamped.min_num_buckets(), 1);
                assert_eq!(clamped.bin_count_factor(), 1);
            }

            #[test]
            fn test_try_with_buckets_rejects_zero() {
                let err = CalendarQueue::<f64, _>::try_with_buckets(F64Comparator::new(), 0, 2)
                    .unwrap_err();
                assert!(err.message().contains("min_num_buckets"));
                let err = CalendarQueue::<f64, _>::try_with_buckets(F64Comparator::new(), 2, 0)
                    .unwrap_err();
                assert!(err.message().contains("bin_count_factor"));
            }
        }

        mod listeners {
            use super::*;

            #[test]
            fn test_messages_for_each_operation() {
                let recorder = Arc::new(RecorderListener::new());
                let mut queue = keyed_queue();
                let listener: Arc<dyn DebugListener> = recorder.clone();
                assert!(queue.add_debug_listener(listener.clone()));
                assert!(!queue.add_debug_listener(listener.clone()));

                queue.put((2, 0));
                queue.put((1, 1));
                queue.get().unwrap();
                queue.get().unwrap();
                queue.remove(&(2, 0));
                queue.take().unwrap();

                assert_eq!(recorder.messages(), vec![
                    "+++ putting in queue: (2, 0)",
                    "+++ putting in queue: (1, 1)",
                    "--- getting from queue: (1, 1)",
                    "--- removing from queue: (2, 0)",
                    "--- taking from queue: (1, 1)",
                ]);

                assert!(queue.remove_debug_listener(&listener));
                queue.put((3, 2));
                assert_eq!(recorder.messages().len(), 5);
            }
        }

        mod corruption {
            use super::*;

            #[test]
            fn test_check_invariants_detects_reprojection() {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend([0.0, 1.0, 2.0, 3.0, 5.0]);
                assert_eq!(queue.check_invariants(), Ok(()));

                queue
                    .comparator_mut()
                    .set_bin_width(Some(&[0.0, 10.0, 20.0]));
                assert!(queue.check_invariants().is_err());
            }
        }
    }

    // ==============================================
    // PROPERTY TESTS MODULE
    // ==============================================
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Operation {
            Put(i64),
            Take,
            Get,
            Remove(usize),
        }

        fn operation_strategy() -> impl Strategy<Value = Operation> {
            prop_oneof![
                4 => (-50i64..500).prop_map(Operation::Put),
                2 => Just(Operation::Take),
                1 => Just(Operation::Get),
                1 => (0usize..64).prop_map(Operation::Remove),
            ]
        }

        /// Stable model: sorted by key, FIFO among equal keys.
        fn model_insert(model: &mut Vec<Entry>, entry: Entry) {
            let at = model.partition_point(|e| e.0 <= entry.0);
            model.insert(at, entry);
        }

        proptest! {
            /// Draining yields a stable sort of the inputs.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_drain_is_stable_sort(keys in prop::collection::vec(-1000i64..1000, 0..300)) {
                let mut queue = keyed_queue();
                let mut expected = Vec::new();
                for (seq, key) in keys.into_iter().enumerate() {
                    queue.put((key, seq as u64));
                    expected.push((key, seq as u64));
                }
                expected.sort_by_key(|e| e.0);
                prop_assert_eq!(queue.to_vec().unwrap(), expected.clone());
                prop_assert_eq!(drain(&mut queue), expected);
            }

            /// Arbitrary operation sequences agree with a sorted-vector model.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_matches_sorted_model(ops in prop::collection::vec(operation_strategy(), 0..400)) {
                let mut queue = keyed_queue();
                let mut model: Vec<Entry> = Vec::new();
                for (seq, op) in ops.into_iter().enumerate() {
                    match op {
                        Operation::Put(key) => {
                            queue.put((key, seq as u64));
                            model_insert(&mut model, (key, seq as u64));
                        },
                        Operation::Take => {
                            let expected = if model.is_empty() {
                                Err(QueueError::Empty)
                            } else {
                                Ok(model.remove(0))
                            };
                            prop_assert_eq!(queue.take(), expected);
                        },
                        Operation::Get => {
                            prop_assert_eq!(queue.get().ok().copied(), model.first().copied());
                        },
                        Operation::Remove(pick) => {
                            if model.is_empty() {
                                prop_assert_eq!(queue.remove(&(0, u64::MAX)), None);
                            } else {
                                let victim = model.remove(pick % model.len());
                                prop_assert_eq!(queue.remove(&victim), Some(victim));
                            }
                        },
                    }
                    prop_assert_eq!(queue.len(), model.len());
                    queue.debug_validate_invariants();
                }
            }

            /// Resizing never changes what comes out.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_resize_is_transparent(ops in prop::collection::vec(operation_strategy(), 0..400)) {
                let mut adaptive = keyed_queue();
                let mut fixed = keyed_queue();
                fixed.set_adaptive(false);
                for (seq, op) in ops.into_iter().enumerate() {
                    match op {
                        Operation::Put(key) => {
                            adaptive.put((key, seq as u64));
                            fixed.put((key, seq as u64));
                        },
                        Operation::Take | Operation::Remove(_) => {
                            prop_assert_eq!(adaptive.take(), fixed.take());
                        },
                        Operation::Get => {
                            prop_assert_eq!(adaptive.get().ok().copied(), fixed.get().ok().copied());
                        },
                    }
                }
                prop_assert_eq!(adaptive.to_vec().unwrap(), fixed.to_vec().unwrap());
                prop_assert_eq!(fixed.bucket_count(), 2);
            }

            /// Float timestamps with the self-tuning comparator come out sorted.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_f64_drain_sorted(values in prop::collection::vec(-1.0e6f64..1.0e6, 0..300)) {
                let mut queue = CalendarQueue::new(F64Comparator::new());
                queue.extend(values.iter().copied());
                let mut expected = values;
                expected.sort_by(f64::total_cmp);
                prop_assert_eq!(drain(&mut queue), expected);
            }
        }
    }
}
