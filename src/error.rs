//! Error types for the calqueue library.
//!
//! ## Key Components
//!
//! - [`QueueError`]: Returned by [`take`](crate::queue::CalendarQueue::take),
//!   [`get`](crate::queue::CalendarQueue::get) and the ordered snapshot
//!   methods. Distinguishes caller misuse (empty queue) from internal faults.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (bucket bookkeeping disagrees with the recorded size).
//! - [`ConfigError`]: Returned when queue configuration parameters are invalid
//!   (e.g. zero buckets, bin count factor out of range).
//!
//! ## Example Usage
//!
//! ```
//! use calqueue::comparator::F64Comparator;
//! use calqueue::error::QueueError;
//! use calqueue::queue::CalendarQueue;
//!
//! let mut queue = CalendarQueue::new(F64Comparator::new());
//!
//! // Taking from an empty queue is a recoverable precondition failure
//! assert_eq!(queue.take(), Err(QueueError::Empty));
//!
//! queue.put(2.5);
//! assert_eq!(queue.take(), Ok(2.5));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// QueueError
// ---------------------------------------------------------------------------

/// Error returned by queue operations that need at least one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue holds no entries. Always avoidable by checking
    /// [`is_empty`](crate::queue::CalendarQueue::is_empty) first; the queue
    /// is left unchanged.
    Empty,
    /// The recorded size disagrees with the bucket contents. This is a bug in
    /// the structure (or a comparator that changed its projection of queued
    /// entries); the queue should be considered unusable afterwards.
    Corrupted(InvariantError),
}

impl QueueError {
    /// Returns `true` for [`QueueError::Empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, QueueError::Empty)
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Empty => f.write_str("queue is empty"),
            QueueError::Corrupted(err) => write!(f, "queue is corrupted: {}", err),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueueError::Empty => None,
            QueueError::Corrupted(err) => Some(err),
        }
    }
}

impl From<InvariantError> for QueueError {
    fn from(err: InvariantError) -> Self {
        QueueError::Corrupted(err)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal queue invariants are violated.
///
/// Produced by the minimum-bucket search and the ordered snapshot walk when
/// the size is non-zero but no bucket yields an entry, and by
/// [`CalendarQueue::check_invariants`](crate::queue::CalendarQueue::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when queue configuration parameters are invalid.
///
/// Produced by [`CalendarQueue::try_with_buckets`](crate::queue::CalendarQueue::try_with_buckets),
/// [`CalendarQueueBuilder::try_build`](crate::builder::CalendarQueueBuilder::try_build)
/// and [`ceil_log2`](crate::policy::resize::ceil_log2).
///
/// # Example
///
/// ```
/// use calqueue::builder::CalendarQueueBuilder;
/// use calqueue::comparator::F64Comparator;
///
/// let err = CalendarQueueBuilder::new()
///     .min_num_buckets(0)
///     .try_build::<f64, _>(F64Comparator::new())
///     .unwrap_err();
/// assert!(err.to_string().contains("min_num_buckets"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
