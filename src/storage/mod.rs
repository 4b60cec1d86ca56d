//! Cache containers built on the refresh engine.

pub mod list;
pub mod map;
pub mod set;
pub mod store;
mod whole;

#[cfg(test)]
mod list_test;
#[cfg(test)]
mod set_test;

// Re-export main types
pub use list::List;
pub use map::Map;
pub use set::Set;
pub use store::Store;
