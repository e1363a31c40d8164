//! JSON-lines result sink

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::domain::entities::FlaggedRecord;
use crate::domain::ports::MatchSink;
use crate::error::PipelineError;

/// Writes one flagged record per line
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> MatchSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, flagged: Vec<FlaggedRecord>) -> Result<(), PipelineError> {
        let mut buf = Vec::new();
        for record in &flagged {
            serde_json::to_writer(&mut buf, record)
                .map_err(|e| PipelineError::Sink(e.to_string()))?;
            buf.push(b'\n');
        }
        self.writer
            .write_all(&buf)
            .await
            .map_err(|e| PipelineError::Sink(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), PipelineError> {
        self.writer
            .flush()
            .await
            .map_err(|e| PipelineError::Sink(e.to_string()))
    }
}
