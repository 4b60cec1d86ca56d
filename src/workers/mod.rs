// Background workers attached to each cache instance.

pub mod backend;
pub mod sweeper;

// Re-export main types
pub use backend::Sweep;
pub use sweeper::Sweeper;
