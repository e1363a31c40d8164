//! JSON-lines record source

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::domain::entities::DomainRecord;
use crate::domain::ports::RecordSource;
use crate::error::PipelineError;

/// Reads one `DomainRecord` per line, skipping blank lines
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

#[async_trait]
impl<R> RecordSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_record(&mut self) -> Result<Option<DomainRecord>, PipelineError> {
        while let Some(text) = self
            .lines
            .next_line()
            .await
            .map_err(PipelineError::Read)?
        {
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&text).map_err(|e| PipelineError::Source {
                line: self.line,
                message: e.to_string(),
            })?;
            return Ok(Some(record));
        }
        Ok(None)
    }
}
