//! reqwest implementation of the threat-matching transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::domain::ports::{ApiRequest, ApiResponse, ThreatTransport};
use crate::error::TransportError;

/// HTTP transport; each processing host builds its own
pub struct HttpThreatTransport {
    http: Client,
}

impl HttpThreatTransport {
    /// `timeout` bounds each attempt, connect through body
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ThreatTransport for HttpThreatTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self
            .http
            .post(request.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
