//! Safe Browsing v4 `threatMatches:find` request shape
//!
//! See <https://developers.google.com/safe-browsing/v4/lookup-api>.

use reqwest::Url;
use serde::Serialize;

use crate::app::batch::DrainedBatch;
use crate::domain::entities::ThreatType;
use crate::domain::ports::ApiRequest;
use crate::error::EvaluationError;

const ANY_PLATFORM: &str = "ANY_PLATFORM";
const URL_ENTRY_TYPE: &str = "URL";

/// Identifies the caller to the API
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            client_id: "domainregistry".to_string(),
            client_version: "0.0.1".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindThreatMatchesRequest<'a> {
    client: ClientBlock<'a>,
    threat_info: ThreatInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientBlock<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: &'a [ThreatType],
    platform_types: [&'static str; 1],
    threat_entry_types: [&'static str; 1],
    threat_entries: Vec<ThreatEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ThreatEntry<'a> {
    url: &'a str,
}

/// Build the endpoint URL with the API key attached as `key`
pub fn build_url(endpoint: &str, api_key: &str) -> Result<Url, EvaluationError> {
    let mut url = Url::parse(endpoint).map_err(|e| EvaluationError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(EvaluationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: "not a hierarchical URL".to_string(),
        });
    }
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Encode the request body listing every domain in the batch
pub fn build_body(
    client: &ClientInfo,
    threat_types: &[ThreatType],
    batch: &DrainedBatch,
) -> Result<Vec<u8>, EvaluationError> {
    let request = FindThreatMatchesRequest {
        client: ClientBlock {
            client_id: &client.client_id,
            client_version: &client.client_version,
        },
        threat_info: ThreatInfo {
            threat_types,
            platform_types: [ANY_PLATFORM],
            threat_entry_types: [URL_ENTRY_TYPE],
            threat_entries: batch
                .domain_names()
                .map(|url| ThreatEntry { url })
                .collect(),
        },
    };
    Ok(serde_json::to_vec(&request)?)
}

/// Build the complete request; nothing is sent if this fails
pub fn build_request(
    endpoint: &str,
    api_key: &str,
    client: &ClientInfo,
    threat_types: &[ThreatType],
    batch: &DrainedBatch,
) -> Result<ApiRequest, EvaluationError> {
    Ok(ApiRequest {
        url: build_url(endpoint, api_key)?,
        body: build_body(client, threat_types, batch)?,
    })
}
