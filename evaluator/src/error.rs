//! Error types for threatcheck
//!
//! This module defines error types for each layer:
//! - `TransportError`: Failures talking to the threat-matching endpoint
//! - `EvaluationError`: Fatal failures of a single batch evaluation
//! - `ConfigError`: Invalid or missing configuration
//! - `PipelineError`: Failures of the record source, the sink, or a processing unit

use thiserror::Error;

use crate::app::pipeline::PipelineSummary;

/// Transport errors from the HTTP adapter
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether a fresh attempt may succeed (I/O level faults only)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Timeout(_) | TransportError::Body(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Fatal batch evaluation errors
///
/// Any of these terminates the owning processing unit. Non-success statuses and
/// malformed responses are not errors; they reduce the result set instead.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Invalid threat-matching endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("Failed to serialize threat-matching request: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("BATCH_SIZE must be between 1 and {max}, got {value}")]
    BatchSize { value: usize, max: usize },
}

/// Pipeline errors surfaced to the binary
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Processing unit {unit} failed: {source}")]
    Unit {
        unit: usize,
        #[source]
        source: EvaluationError,
    },

    #[error("Invalid record on line {line}: {message}")]
    Source { line: usize, message: String },

    #[error("Failed to read records: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write results: {0}")]
    Sink(String),

    #[error("Processing unit stopped unexpectedly: {0}")]
    UnitAborted(String),

    /// The run completed but at least one unit failed along the way
    #[error("{} processing unit(s) failed: {source}", .summary.failed_units)]
    UnitsFailed {
        summary: PipelineSummary,
        #[source]
        source: Box<PipelineError>,
    },
}
