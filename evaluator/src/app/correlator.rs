//! Result correlation
//!
//! Parses a threat-matching response and pairs every match with the buffered
//! record it refers to. Malformed entries and unknown domains are logged and
//! skipped; they never fail the batch.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::app::batch::DrainedBatch;
use crate::domain::entities::{FlaggedRecord, ThreatMatch, ThreatType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    threat_type: ThreatType,
    threat: RawThreat,
}

#[derive(Debug, Deserialize)]
struct RawThreat {
    url: String,
}

/// Correlate a successful response body with the batch it answers
pub fn correlate(body: &str, batch: &DrainedBatch) -> Vec<FlaggedRecord> {
    if body.trim().is_empty() {
        tracing::info!("Response was empty, no threats detected");
        return Vec::new();
    }

    let response: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Discarding unparsable threat-matching response: {}", e);
            return Vec::new();
        }
    };

    let matches = match &response {
        Value::Object(fields) if fields.is_empty() => {
            tracing::info!("Response was empty, no threats detected");
            return Vec::new();
        }
        Value::Object(fields) => match fields.get("matches") {
            Some(Value::Array(matches)) => matches,
            _ => {
                tracing::warn!("Response has no matches array, treating as no threats");
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("Response is not a JSON object, treating as no threats");
            return Vec::new();
        }
    };

    let records = batch.by_domain_name();
    let mut seen = HashSet::new();
    let mut flagged = Vec::new();

    for (i, entry) in matches.iter().enumerate() {
        let raw = match RawMatch::deserialize(entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed match #{}: {}", i, e);
                continue;
            }
        };

        let Some(record) = records.get(raw.threat.url.as_str()) else {
            tracing::warn!(
                "Response referenced {} which is not in the current batch",
                raw.threat.url
            );
            continue;
        };

        if !seen.insert((raw.threat.url.clone(), raw.threat_type.clone())) {
            continue;
        }

        flagged.push(FlaggedRecord::new(
            (*record).clone(),
            ThreatMatch::new(raw.threat_type, record.domain_name()),
        ));
    }

    flagged
}
