//! JSON-lines record source and result sink

mod sink;
mod source;

pub use sink::JsonLinesSink;
pub use source::JsonLinesSource;
