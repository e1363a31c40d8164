//! Threat match entities
//!
//! A threat match is only produced for a domain the external service flagged.
//! A domain missing from a response is "not flagged", never "unknown".

use serde::{Deserialize, Serialize};

use super::DomainRecord;

/// Threat category reported by the Safe Browsing v4 API
///
/// Categories this crate does not know yet are kept verbatim in `Other`
/// so a new vendor category never drops a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatType {
    Malware,
    SocialEngineering,
    UnwantedSoftware,
    PotentiallyHarmfulApplication,
    Unspecified,
    Other(String),
}

impl ThreatType {
    /// Categories queried when none are configured
    pub fn defaults() -> Vec<ThreatType> {
        vec![
            ThreatType::Malware,
            ThreatType::SocialEngineering,
            ThreatType::UnwantedSoftware,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ThreatType::Malware => "MALWARE",
            ThreatType::SocialEngineering => "SOCIAL_ENGINEERING",
            ThreatType::UnwantedSoftware => "UNWANTED_SOFTWARE",
            ThreatType::PotentiallyHarmfulApplication => "POTENTIALLY_HARMFUL_APPLICATION",
            ThreatType::Unspecified => "THREAT_TYPE_UNSPECIFIED",
            ThreatType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ThreatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThreatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty threat type".to_string());
        }
        Ok(ThreatType::from(s.to_uppercase()))
    }
}

impl From<String> for ThreatType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "MALWARE" => ThreatType::Malware,
            "SOCIAL_ENGINEERING" => ThreatType::SocialEngineering,
            "UNWANTED_SOFTWARE" => ThreatType::UnwantedSoftware,
            "POTENTIALLY_HARMFUL_APPLICATION" => ThreatType::PotentiallyHarmfulApplication,
            "THREAT_TYPE_UNSPECIFIED" => ThreatType::Unspecified,
            _ => ThreatType::Other(s),
        }
    }
}

impl From<ThreatType> for String {
    fn from(t: ThreatType) -> Self {
        match t {
            ThreatType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A (category, domain name) pair the external service flagged
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    pub threat_type: ThreatType,
    pub domain_name: String,
}

impl ThreatMatch {
    pub fn new(threat_type: ThreatType, domain_name: impl Into<String>) -> Self {
        Self {
            threat_type,
            domain_name: domain_name.into(),
        }
    }
}

/// A buffered record paired with the match that flagged it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedRecord {
    pub domain: DomainRecord,
    pub threat_match: ThreatMatch,
}

impl FlaggedRecord {
    pub fn new(domain: DomainRecord, threat_match: ThreatMatch) -> Self {
        Self {
            domain,
            threat_match,
        }
    }
}
