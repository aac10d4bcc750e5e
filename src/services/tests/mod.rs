//! Unit tests for the provider registry

mod registry;
