pub use crate::builder::CalendarQueueBuilder;
pub use crate::comparator::{F64Comparator, KeyedComparator, Timed, TimedComparator};
pub use crate::debug::{DebugListener, RecorderListener, TracingListener};
pub use crate::error::{ConfigError, InvariantError, QueueError};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CalendarQueueMetricsSnapshot;
pub use crate::queue::CalendarQueue;
#[cfg(feature = "concurrency")]
pub use crate::queue::ConcurrentCalendarQueue;
pub use crate::traits::CqComparator;
