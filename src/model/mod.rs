// Package model provides the cache unit the refresh engine operates on.

pub mod unit;

// Re-export main types
pub use unit::Unit;
