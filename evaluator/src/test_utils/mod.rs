//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//! Mocks are hand-written: they script responses in order and record every
//! call so tests can assert on what actually went over the wire.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
