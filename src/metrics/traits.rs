//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are split into small traits so the
//! queue only ever writes counters and never knows who reads them.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────┐
//!                 │     CalendarMetricsRecorder      │
//!                 │  put/take/get/remove/clear       │
//!                 │  min search, resize, bin width   │
//!                 └────────────────┬─────────────────┘
//!                                  │
//!                                  ▼
//!                       ┌─────────────────────┐       ┌─────────────────────────────┐
//!                       │ CalendarQueueMetrics│◄──────│ CalendarMetricsReadRecorder │
//!                       │  (u64 + ReadCounter)│       │ (&self paths: contains)     │
//!                       └──────────┬──────────┘       └─────────────────────────────┘
//!                                  │ snapshot()
//!                                  ▼
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters recorded from `&mut self` queue operations.
pub trait CalendarMetricsRecorder {
    fn record_put_call(&mut self);
    fn record_take_call(&mut self);
    fn record_take_empty(&mut self);
    fn record_get_call(&mut self);
    fn record_get_cache_hit(&mut self);
    fn record_remove_call(&mut self);
    fn record_remove_found(&mut self);
    fn record_min_search(&mut self, steps: usize, exact: bool);
    fn record_grow(&mut self);
    fn record_shrink(&mut self);
    fn record_rebucketed_entries(&mut self, count: usize);
    fn record_bin_width_update(&mut self);
    fn record_clear(&mut self);
}

/// Counters recorded from `&self` queue operations (interior mutability).
pub trait CalendarMetricsReadRecorder {
    fn record_contains_call(&self);
    fn record_contains_found(&self);
    fn record_to_vec_call(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
