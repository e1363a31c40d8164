//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use serde_json::json;

use crate::domain::entities::DomainRecord;

/// Create a test record for a domain name
pub fn test_record(domain_name: &str) -> DomainRecord {
    DomainRecord::new(domain_name, format!("{}-REPO", domain_name), "test-registrar")
        .with_registrar_email("abuse@registrar.test")
}

/// Create `n` records named `domain-0.test`, `domain-1.test`, ...
pub fn test_records(n: usize) -> Vec<DomainRecord> {
    (0..n)
        .map(|i| test_record(&format!("domain-{}.test", i)))
        .collect()
}

/// A `threatMatches:find` response body listing `(threat type, url)` matches
pub fn matches_body(matches: &[(&str, &str)]) -> String {
    let matches: Vec<_> = matches
        .iter()
        .map(|(threat_type, url)| {
            json!({
                "threatType": threat_type,
                "platformType": "ANY_PLATFORM",
                "threatEntryType": "URL",
                "threat": {"url": url},
                "cacheDuration": "300s"
            })
        })
        .collect();
    json!({ "matches": matches }).to_string()
}
