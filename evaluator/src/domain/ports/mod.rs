//! Domain ports (traits)
//!
//! Port traits define interfaces the evaluator requires.
//! Adapters provide concrete implementations of these traits.

pub mod sink;
pub mod source;
pub mod transport;

pub use sink::MatchSink;
pub use source::RecordSource;
pub use transport::{ApiRequest, ApiResponse, ThreatTransport};
