// Shared test support code for the cache tests.

pub mod common;

pub use common::*;
