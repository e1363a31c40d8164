//! Pending batch
//!
//! Buffers domain records keyed by domain name until the batch is full.
//! Insertion order is kept so requests list domains in arrival order.

use std::collections::HashMap;

use crate::domain::entities::DomainRecord;

/// Vendor hard limit on URLs per threat-matching request
pub const MAX_BATCH_SIZE: usize = 500;

/// Default flush threshold, kept below `MAX_BATCH_SIZE` to tolerate overshoot
pub const DEFAULT_BATCH_SIZE: usize = 490;

/// Insertion-ordered buffer of records, unique by domain name
///
/// Owned by exactly one processing unit; never shared.
#[derive(Debug)]
pub struct PendingBatch {
    threshold: usize,
    records: Vec<DomainRecord>,
    index: HashMap<String, usize>,
}

impl PendingBatch {
    /// `threshold` is clamped to `1..=MAX_BATCH_SIZE`
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.clamp(1, MAX_BATCH_SIZE);
        Self {
            threshold,
            records: Vec::with_capacity(threshold),
            index: HashMap::with_capacity(threshold),
        }
    }

    /// Insert a record; a record with the same domain name is replaced in place
    pub fn ingest(&mut self, record: DomainRecord) {
        match self.index.get(record.domain_name()) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index
                    .insert(record.domain_name().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.threshold
    }

    #[cfg(test)]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Take every buffered record, leaving the batch empty
    pub fn drain_all(&mut self) -> DrainedBatch {
        self.index.clear();
        DrainedBatch {
            records: std::mem::replace(&mut self.records, Vec::with_capacity(self.threshold)),
        }
    }
}

/// Records taken out of a `PendingBatch` for one flush
#[derive(Debug, Default)]
pub struct DrainedBatch {
    records: Vec<DomainRecord>,
}

impl DrainedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Domain names in insertion order
    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.domain_name())
    }

    /// Exact-match lookup by domain name
    #[cfg(test)]
    pub fn get(&self, domain_name: &str) -> Option<&DomainRecord> {
        self.records.iter().find(|r| r.domain_name() == domain_name)
    }

    /// Index by domain name for correlating a whole response
    pub fn by_domain_name(&self) -> HashMap<&str, &DomainRecord> {
        self.records
            .iter()
            .map(|r| (r.domain_name(), r))
            .collect()
    }
}

#[cfg(test)]
impl From<Vec<DomainRecord>> for DrainedBatch {
    fn from(records: Vec<DomainRecord>) -> Self {
        let mut batch = PendingBatch::new(MAX_BATCH_SIZE);
        for record in records {
            batch.ingest(record);
        }
        batch.drain_all()
    }
}
