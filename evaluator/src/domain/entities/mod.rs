//! Domain entities

pub mod record;
pub mod threat;

pub use record::DomainRecord;
pub use threat::{FlaggedRecord, ThreatMatch, ThreatType};
