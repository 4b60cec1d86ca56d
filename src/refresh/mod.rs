//! Refresh engine: expiry tracking, pre-build windowing and rebuild gating.

pub mod counters;
pub mod refresher;
pub mod telemetry;


// Re-export main types
pub use counters::{Counters, Stats};
pub use refresher::{prebuild_window, Gate, Refresher};
