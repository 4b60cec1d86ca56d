//! Scenario tests that drive several containers together through the public
//! API, the way an application wires them up.

mod cases_concurrent_test;

pub mod support;
