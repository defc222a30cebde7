//! Operational counters for [`CalendarQueue`](crate::queue::CalendarQueue).
//!
//! Compiled only with the `metrics` feature.

pub mod counter;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
