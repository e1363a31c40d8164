//! threatcheck
//!
//! Checks registered domain names against the Safe Browsing Lookup API in
//! batches and prints every flagged domain with its threat type.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.
//!
//! Records are read as JSON lines from the file given as the first argument,
//! or from stdin. Results are written as JSON lines to stdout; logs go to stderr.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod error;

#[cfg(test)]
mod test_utils;

use adapters::{HttpThreatTransport, JsonLinesSink, JsonLinesSource};
use app::{Retrier, ThreatQueryClient};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stdout carries results)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,threatcheck_evaluator=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting threatcheck...");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    tracing::debug!("Loaded {:?}", config);

    // Create adapters
    let transport = Arc::new(
        HttpThreatTransport::new(config.request_timeout).context("Failed to build HTTP client")?,
    );

    // Create application services
    let client = Arc::new(ThreatQueryClient::new(
        transport,
        config.query_client(),
        Retrier::new(config.retry()),
    ));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("Reading records from {}", path);
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path))?;
            Box::new(BufReader::new(file))
        }
        None => {
            tracing::info!("Reading records from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let mut source = JsonLinesSource::new(reader);
    let mut sink = JsonLinesSink::new(tokio::io::stdout());
    let pipeline = config.pipeline();

    tokio::select! {
        result = app::run(&mut source, &mut sink, client, &pipeline) => {
            let summary = result.context("Threat evaluation failed")?;
            tracing::info!(
                "Done: {} record(s) checked, {} flagged",
                summary.records_read,
                summary.flagged
            );
        }
        _ = interrupted(tokio::signal::ctrl_c()) => {
            tracing::warn!("Interrupted, abandoning in-flight batches");
            anyhow::bail!("Interrupted before every record was evaluated");
        }
    }

    Ok(())
}

/// Resolves once `signal` fires; never resolves if the handler can't be installed
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Failed to listen for ctrl-c, running without it: {}", e);
        std::future::pending::<()>().await;
    }
}
