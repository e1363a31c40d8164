//! HTTP adapter for the threat-matching API

mod transport;

pub use transport::HttpThreatTransport;
