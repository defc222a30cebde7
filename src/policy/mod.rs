//! Bucket-count policies.

pub mod resize;

pub use resize::{ResizeDecision, ResizePolicy, ceil_log2};
