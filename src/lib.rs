//! calqueue: an adaptive calendar queue for discrete-event scheduling.
//!
//! See [`queue`] for the data structure and [`traits`] for the comparator
//! contract that drives it.

pub mod builder;
pub mod comparator;
pub mod debug;
pub mod ds;
pub mod error;
pub mod policy;
pub mod queue;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
