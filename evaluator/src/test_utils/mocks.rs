//! Mock implementations of port traits
//!
//! In-memory implementations that can be configured for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::entities::{DomainRecord, FlaggedRecord};
use crate::domain::ports::{ApiRequest, ApiResponse, MatchSink, RecordSource, ThreatTransport};
use crate::error::{PipelineError, TransportError};
use crate::test_utils::matches_body;

// ============================================================================
// Scripted Transport
// ============================================================================

/// Transport that replays scripted outcomes and records every request
///
/// Once the script runs out every call answers `200` with an empty body.
#[derive(Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    flagged: Vec<(String, String)>,
    unreachable_for: Vec<String>,
    hang: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body
    pub fn with_response(self, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    /// Queue a transport failure
    pub fn with_error(self, error: TransportError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Answer every request listing `domain` with a match for it
    ///
    /// Consulted once the script is empty, so concurrent units get stable answers.
    pub fn flagging(mut self, threat_type: &str, domain: &str) -> Self {
        self.flagged.push((threat_type.to_string(), domain.to_string()));
        self
    }

    /// Fail with a connect error for every request listing `domain`
    pub fn unreachable_for(mut self, domain: &str) -> Self {
        self.unreachable_for.push(domain.to_string());
        self
    }

    /// Never answer; used to simulate a unit torn down mid-flush
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreatTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.hang {
            std::future::pending::<()>().await;
        }

        let body = String::from_utf8_lossy(&request.body).into_owned();
        let lists = |domain: &str| body.contains(&format!("\"{}\"", domain));

        if let Some(domain) = self.unreachable_for.iter().find(|d| lists(d.as_str())) {
            return Err(TransportError::Connect(format!("{} is unreachable", domain)));
        }

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }

        let matched: Vec<(&str, &str)> = self
            .flagged
            .iter()
            .filter(|(_, domain)| lists(domain.as_str()))
            .map(|(threat_type, domain)| (threat_type.as_str(), domain.as_str()))
            .collect();
        Ok(ApiResponse {
            status: 200,
            body: if matched.is_empty() {
                String::new()
            } else {
                matches_body(&matched)
            },
        })
    }
}

// ============================================================================
// In-Memory Source and Sink
// ============================================================================

/// Source yielding records from a vector
pub struct VecSource {
    records: VecDeque<DomainRecord>,
    read: usize,
    fail_after: Option<usize>,
}

impl VecSource {
    pub fn new(records: Vec<DomainRecord>) -> Self {
        Self {
            records: records.into(),
            read: 0,
            fail_after: None,
        }
    }

    /// Report a malformed line once `n` records have been read
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl RecordSource for VecSource {
    async fn next_record(&mut self) -> Result<Option<DomainRecord>, PipelineError> {
        if self.fail_after == Some(self.read) {
            return Err(PipelineError::Source {
                line: self.read + 1,
                message: "mock failure".to_string(),
            });
        }
        self.read += 1;
        Ok(self.records.pop_front())
    }
}

/// Sink collecting everything emitted
#[derive(Default)]
pub struct CollectingSink {
    pub flagged: Vec<FlaggedRecord>,
    pub emits: usize,
    pub closed: bool,
    fail: bool,
}

impl CollectingSink {
    /// Sink whose every emit fails, like a full disk
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MatchSink for CollectingSink {
    async fn emit(&mut self, flagged: Vec<FlaggedRecord>) -> Result<(), PipelineError> {
        self.emits += 1;
        if self.fail {
            return Err(PipelineError::Sink("disk full".to_string()));
        }
        self.flagged.extend(flagged);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PipelineError> {
        self.closed = true;
        Ok(())
    }
}
