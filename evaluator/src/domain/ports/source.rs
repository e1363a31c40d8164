//! Upstream record source port

use async_trait::async_trait;

use crate::domain::entities::DomainRecord;
use crate::error::PipelineError;

/// Yields domain records until the input is exhausted
#[async_trait]
pub trait RecordSource: Send {
    async fn next_record(&mut self) -> Result<Option<DomainRecord>, PipelineError>;
}
