//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod http;
pub mod jsonl;

pub use http::HttpThreatTransport;
pub use jsonl::{JsonLinesSink, JsonLinesSource};
