//! Downstream sink port

use async_trait::async_trait;

use crate::domain::entities::FlaggedRecord;
use crate::error::PipelineError;

/// Receives flagged records, once per completed flush
#[async_trait]
pub trait MatchSink: Send {
    async fn emit(&mut self, flagged: Vec<FlaggedRecord>) -> Result<(), PipelineError>;

    /// Flush anything buffered by the sink itself
    async fn close(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }
}
