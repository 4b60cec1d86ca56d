//! Background eviction of expired-but-unread content.

pub mod sweeper;

// Re-export main types
pub use sweeper::Sweeper;
