//! Evaluation unit
//!
//! One processing unit: owns a single pending batch, flushes it when full and
//! at the end of input. The batch is drained before the query starts, so it is
//! empty again whether the query succeeds, finds nothing, or fails fatally.
//! A unit dropped mid-flush abandons the call and emits nothing for it.

use std::sync::Arc;

use crate::app::batch::PendingBatch;
use crate::app::query_client::ThreatQueryClient;
use crate::domain::entities::{DomainRecord, FlaggedRecord};
use crate::domain::ports::ThreatTransport;
use crate::error::EvaluationError;

/// Single-owner batcher in front of a `ThreatQueryClient`
pub struct EvaluationUnit<T>
where
    T: ThreatTransport,
{
    client: Arc<ThreatQueryClient<T>>,
    batch: PendingBatch,
    flushes: u64,
}

impl<T> EvaluationUnit<T>
where
    T: ThreatTransport,
{
    pub fn new(client: Arc<ThreatQueryClient<T>>, batch_size: usize) -> Self {
        Self {
            client,
            batch: PendingBatch::new(batch_size),
            flushes: 0,
        }
    }

    /// Buffer a record, flushing once the batch reaches its threshold
    pub async fn process(
        &mut self,
        record: DomainRecord,
    ) -> Result<Vec<FlaggedRecord>, EvaluationError> {
        self.batch.ingest(record);
        if self.batch.is_full() {
            self.flush().await
        } else {
            Ok(Vec::new())
        }
    }

    /// Flush whatever is left at the end of input
    pub async fn finish(&mut self) -> Result<Vec<FlaggedRecord>, EvaluationError> {
        if self.batch.is_empty() {
            return Ok(Vec::new());
        }
        self.flush().await
    }

    /// Evaluate and clear the current batch
    pub async fn flush(&mut self) -> Result<Vec<FlaggedRecord>, EvaluationError> {
        tracing::debug!("Flushing {} pending record(s)", self.batch.len());
        let drained = self.batch.drain_all();
        self.flushes += 1;
        self.client.evaluate(&drained).await
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}
