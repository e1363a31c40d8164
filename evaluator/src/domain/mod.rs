//! Domain layer
//!
//! Contains the records and threat matches the evaluator works with.
//! - `entities`: Domain models representing core concepts
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod ports;
