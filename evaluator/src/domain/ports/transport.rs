//! Threat-matching transport port
//!
//! The query client builds requests and parses responses; the transport only
//! moves bytes. Swapping the transport is how tests avoid the network.

use async_trait::async_trait;
use reqwest::Url;

use crate::error::TransportError;

/// A fully built threat-matching request
///
/// Requests are idempotent and may be sent any number of times.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Endpoint including the `key` query parameter
    pub url: Url,
    /// JSON encoded body
    pub body: Vec<u8>,
}

/// Raw response from the endpoint
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Port trait for sending threat-matching requests
#[async_trait]
pub trait ThreatTransport: Send + Sync {
    /// POST the request as `application/json` and return status and body.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
