//! Shared helpers for the ensemble test suites

pub mod fixtures;

pub use fixtures::*;
