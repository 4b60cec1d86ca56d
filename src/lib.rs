//! TTL refresh caches for slowly changing reference data.
//!
//! Each container holds the result of an expensive source call and rebuilds
//! it when it expires. Readers never see a torn payload, expired content is
//! rebuilt by exactly one caller, content close to expiry is rebuilt in the
//! background, and a sweeper resets whatever nobody reads any more.

#[path = "shared/time/mod.rs"]
pub mod time;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod refresh;
pub mod source;
pub mod storage;
pub mod workers;

pub use config::Options;
pub use error::CacheError;
pub use refresh::{Gate, Stats};
pub use source::{ListSource, MapSource, SetSource, StoreSource};
pub use storage::{List, Map, Set, Store};
pub use time::{Clock, ManualClock, SystemClock};
