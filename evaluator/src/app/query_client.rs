//! Threat query client
//!
//! Turns a drained batch into one `threatMatches:find` call and correlates
//! the answer. Transport faults are retried; everything else is decided
//! here:
//! - request building failures are fatal and never reach the network
//! - non-success statuses are logged and count as "no matches"
//! - response shape problems only drop the affected matches

use std::sync::Arc;

use crate::app::batch::DrainedBatch;
use crate::app::correlator::correlate;
use crate::app::request::{build_request, ClientInfo};
use crate::app::retry::{Retrier, TransientTransportPolicy};
use crate::domain::entities::{FlaggedRecord, ThreatType};
use crate::domain::ports::ThreatTransport;
use crate::error::EvaluationError;

/// Default Safe Browsing Lookup API endpoint
pub const SAFE_BROWSING_URL: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

/// Settings for the threat-matching API
#[derive(Clone)]
pub struct QueryClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub client: ClientInfo,
    pub threat_types: Vec<ThreatType>,
}

impl QueryClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: SAFE_BROWSING_URL.to_string(),
            api_key: api_key.into(),
            client: ClientInfo::default(),
            threat_types: ThreatType::defaults(),
        }
    }
}

impl std::fmt::Debug for QueryClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("client", &self.client)
            .field("threat_types", &self.threat_types)
            .finish()
    }
}

/// Client for evaluating batches against the threat-matching API
pub struct ThreatQueryClient<T>
where
    T: ThreatTransport,
{
    transport: Arc<T>,
    config: QueryClientConfig,
    retrier: Retrier,
}

impl<T> ThreatQueryClient<T>
where
    T: ThreatTransport,
{
    pub fn new(transport: Arc<T>, config: QueryClientConfig, retrier: Retrier) -> Self {
        Self {
            transport,
            config,
            retrier,
        }
    }

    /// Evaluate every record in the batch and return the flagged ones
    pub async fn evaluate(
        &self,
        batch: &DrainedBatch,
    ) -> Result<Vec<FlaggedRecord>, EvaluationError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let request = build_request(
            &self.config.endpoint,
            &self.config.api_key,
            &self.config.client,
            &self.config.threat_types,
            batch,
        )?;

        tracing::debug!("Checking {} domain(s) for threats", batch.len());

        let response = self
            .retrier
            .call(|| self.transport.send(&request), &TransientTransportPolicy)
            .await
            .map_err(|failure| EvaluationError::Transport {
                attempts: failure.attempts,
                source: failure.error,
            })?;

        if !response.is_success() {
            tracing::warn!(
                "Got unexpected status code {} from threat-matching API, skipping {} domain(s): {}",
                response.status,
                batch.len(),
                response.body.trim()
            );
            return Ok(Vec::new());
        }

        let flagged = correlate(&response.body, batch);
        tracing::info!(
            "Evaluated {} domain(s), {} flagged",
            batch.len(),
            flagged.len()
        );
        Ok(flagged)
    }
}
