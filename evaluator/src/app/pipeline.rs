//! Pipeline runner
//!
//! Fans records out to independent evaluation units and fans their results
//! back into a single sink. Each unit runs in its own task, owns its own batch
//! and shares nothing mutable with the others. Records are routed by a hash of
//! the domain name so repeats of a name always meet in the same batch.
//!
//! Dropping the future returned by [`run`] aborts every unit; flushes still in
//! flight are abandoned and emit nothing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::app::batch::DEFAULT_BATCH_SIZE;
use crate::app::evaluation_unit::EvaluationUnit;
use crate::app::query_client::ThreatQueryClient;
use crate::domain::entities::{DomainRecord, FlaggedRecord};
use crate::domain::ports::{MatchSink, RecordSource, ThreatTransport};
use crate::error::{EvaluationError, PipelineError};

/// How many units to run and how big their batches are
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub batch_size: usize,
    /// Per-unit inbound queue depth
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: DEFAULT_BATCH_SIZE,
            channel_capacity: 1024,
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub records_read: usize,
    pub flagged: usize,
    /// Records a failed unit never evaluated: still queued, or routed to it later
    pub dropped: usize,
    pub failed_units: usize,
}

/// Evaluate every record from `source`, delivering flagged ones to `sink`
///
/// A source or sink failure stops the run at once: every unit is aborted and
/// in-flight flushes are abandoned. A failing unit stops only itself; once the
/// remaining units have drained the run reports `PipelineError::UnitsFailed`
/// with the summary and the first unit error.
pub async fn run<T, R, S>(
    source: &mut R,
    sink: &mut S,
    client: Arc<ThreatQueryClient<T>>,
    config: &PipelineConfig,
) -> Result<PipelineSummary, PipelineError>
where
    T: ThreatTransport + 'static,
    R: RecordSource,
    S: MatchSink,
{
    let workers = config.workers.max(1);
    let (results_tx, mut results_rx) = mpsc::channel::<Vec<FlaggedRecord>>(workers * 4);

    let mut units = JoinSet::new();
    let mut inboxes = Vec::with_capacity(workers);
    for index in 0..workers {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let unit = EvaluationUnit::new(client.clone(), config.batch_size);
        units.spawn(run_unit(index, unit, rx, results_tx.clone()));
        inboxes.push(Some(tx));
    }
    drop(results_tx);

    // Both halves own their channel ends so an early error closes them
    let feed = async move {
        let mut read = 0usize;
        let mut dropped = 0usize;
        while let Some(record) = source.next_record().await? {
            read += 1;
            let shard = shard_for(record.domain_name(), workers);
            let Some(inbox) = inboxes[shard].as_ref() else {
                dropped += 1;
                continue;
            };
            if inbox.send(record).await.is_err() {
                tracing::warn!("Unit {} has stopped, dropping its remaining records", shard);
                inboxes[shard] = None;
                dropped += 1;
            }
        }
        // Closing the inboxes tells every unit to flush and finish
        inboxes.clear();
        Ok::<_, PipelineError>((read, dropped))
    };

    let drain = async move {
        let mut flagged = 0usize;
        while let Some(batch) = results_rx.recv().await {
            flagged += batch.len();
            sink.emit(batch).await?;
        }
        sink.close().await?;
        Ok::<_, PipelineError>(flagged)
    };

    let ((records_read, dropped), flagged) = match tokio::try_join!(feed, drain) {
        Ok(counts) => counts,
        Err(e) => {
            tracing::error!("{}, stopping all units", e);
            units.shutdown().await;
            return Err(e);
        }
    };

    let mut summary = PipelineSummary {
        records_read,
        flagged,
        dropped,
        failed_units: 0,
    };

    let mut first_unit_error = None;
    while let Some(joined) = units.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(failure)) => {
                summary.dropped += failure.dropped;
                failure.error
            }
            Err(e) => PipelineError::UnitAborted(e.to_string()),
        };
        tracing::error!("{}", failure);
        summary.failed_units += 1;
        first_unit_error.get_or_insert(failure);
    }

    tracing::info!(
        "Read {} record(s), flagged {}, dropped {}, {} failed unit(s)",
        summary.records_read,
        summary.flagged,
        summary.dropped,
        summary.failed_units
    );

    match first_unit_error {
        Some(e) => Err(PipelineError::UnitsFailed {
            summary,
            source: Box::new(e),
        }),
        None => Ok(summary),
    }
}

/// A unit's fatal error and the queued records it never got to
struct UnitFailure {
    error: PipelineError,
    dropped: usize,
}

async fn run_unit<T>(
    index: usize,
    mut unit: EvaluationUnit<T>,
    mut inbox: mpsc::Receiver<DomainRecord>,
    results: mpsc::Sender<Vec<FlaggedRecord>>,
) -> Result<(), UnitFailure>
where
    T: ThreatTransport,
{
    while let Some(record) = inbox.recv().await {
        if results.is_closed() {
            tracing::debug!("Unit {}: result channel closed, stopping", index);
            return Ok(());
        }
        let flagged = match unit.process(record).await {
            Ok(flagged) => flagged,
            Err(e) => return Err(unit_failed(index, &mut inbox, e)),
        };
        if !flagged.is_empty() && results.send(flagged).await.is_err() {
            tracing::debug!("Unit {}: result channel closed, stopping", index);
            return Ok(());
        }
    }

    let flagged = match unit.finish().await {
        Ok(flagged) => flagged,
        Err(e) => return Err(unit_failed(index, &mut inbox, e)),
    };
    if !flagged.is_empty() {
        // Receiver gone means the sink already failed; that error is reported there
        let _ = results.send(flagged).await;
    }
    tracing::debug!("Unit {} finished after {} flush(es)", index, unit.flush_count());
    Ok(())
}

fn unit_failed(
    index: usize,
    inbox: &mut mpsc::Receiver<DomainRecord>,
    source: EvaluationError,
) -> UnitFailure {
    // Refuse new records, then count what is already queued
    inbox.close();
    let mut dropped = 0;
    while inbox.try_recv().is_ok() {
        dropped += 1;
    }
    UnitFailure {
        error: PipelineError::Unit {
            unit: index,
            source,
        },
        dropped,
    }
}

fn shard_for(domain_name: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    domain_name.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query_client::QueryClientConfig;
    use crate::app::retry::{RetryConfig, Retrier};
    use crate::error::TransportError;
    use crate::test_utils::{
        matches_body, test_record, test_records, CollectingSink, MockTransport, VecSource,
    };

    fn create_client(transport: Arc<MockTransport>) -> Arc<ThreatQueryClient<MockTransport>> {
        Arc::new(ThreatQueryClient::new(
            transport,
            QueryClientConfig::new("k"),
            Retrier::new(RetryConfig::immediate(0)),
        ))
    }

    fn config(workers: usize, batch_size: usize) -> PipelineConfig {
        PipelineConfig {
            workers,
            batch_size,
            channel_capacity: 8,
        }
    }

    #[test]
    fn sharding_is_stable() {
        for name in ["a.test", "b.test", "evil.test"] {
            let shard = shard_for(name, 7);
            assert!(shard < 7);
            assert_eq!(shard, shard_for(name, 7));
        }
        assert_eq!(shard_for("anything.test", 1), 0);
    }

    #[tokio::test]
    async fn single_unit_run_delivers_matches() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(200, &matches_body(&[("MALWARE", "domain-2.test")]))
                .with_response(200, &matches_body(&[("SOCIAL_ENGINEERING", "domain-4.test")])),
        );
        let mut source = VecSource::new(test_records(5));
        let mut sink = CollectingSink::default();

        let summary = run(&mut source, &mut sink, create_client(transport.clone()), &config(1, 3))
            .await
            .unwrap();

        assert_eq!(summary.records_read, 5);
        assert_eq!(summary.flagged, 2);
        assert_eq!(summary.failed_units, 0);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(sink.emits, 2);
        assert!(sink.closed);

        let mut names: Vec<String> = sink
            .flagged
            .iter()
            .map(|f| f.domain.domain_name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["domain-2.test", "domain-4.test"]);
    }

    #[tokio::test]
    async fn every_record_is_sent_exactly_once_across_units() {
        let transport = Arc::new(MockTransport::new());
        let mut source = VecSource::new(test_records(50));
        let mut sink = CollectingSink::default();

        let summary = run(&mut source, &mut sink, create_client(transport.clone()), &config(4, 5))
            .await
            .unwrap();

        assert_eq!(summary.records_read, 50);
        let mut sent: Vec<String> = transport
            .requests()
            .iter()
            .flat_map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                body["threatInfo"]["threatEntries"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e["url"].as_str().unwrap().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        sent.sort();
        sent.dedup();
        assert_eq!(sent.len(), 50);
    }

    #[tokio::test]
    async fn duplicate_names_are_batched_together() {
        let transport = Arc::new(MockTransport::new());
        let records = vec![test_record("dup.test"), test_record("dup.test"), test_record("dup.test")];
        let mut source = VecSource::new(records);
        let mut sink = CollectingSink::default();

        run(&mut source, &mut sink, create_client(transport.clone()), &config(3, 10))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_unit_is_reported_with_summary() {
        let transport = Arc::new(
            MockTransport::new().with_error(TransportError::Connect("down".into())),
        );
        let mut source = VecSource::new(test_records(3));
        let mut sink = CollectingSink::default();

        let err = run(&mut source, &mut sink, create_client(transport), &config(1, 2))
            .await
            .unwrap_err();

        let (summary, source) = match err {
            PipelineError::UnitsFailed { summary, source } => (summary, source),
            other => panic!("expected UnitsFailed, got {:?}", other),
        };
        assert!(matches!(
            *source,
            PipelineError::Unit {
                unit: 0,
                source: EvaluationError::Transport { attempts: 1, .. }
            }
        ));
        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.failed_units, 1);
        // The first batch failed; the third record never got evaluated
        assert_eq!(summary.dropped, 1);
        assert!(sink.flagged.is_empty());
        assert!(sink.closed);
    }

    #[tokio::test]
    async fn other_units_finish_when_one_fails() {
        let records = test_records(40);
        let bad = records[0].domain_name.clone();
        let bad_shard = shard_for(&bad, 2);
        let healthy: Vec<String> = records
            .iter()
            .map(|r| r.domain_name.clone())
            .filter(|name| shard_for(name, 2) != bad_shard)
            .take(2)
            .collect();
        assert!(!healthy.is_empty());
        let routed_to_bad = records
            .iter()
            .filter(|r| shard_for(&r.domain_name, 2) == bad_shard)
            .count();

        let mut transport = MockTransport::new().unreachable_for(&bad);
        for name in &healthy {
            transport = transport.flagging("MALWARE", name);
        }
        let transport = Arc::new(transport);
        let mut source = VecSource::new(records);
        let mut sink = CollectingSink::default();

        let err = run(&mut source, &mut sink, create_client(transport), &config(2, 1))
            .await
            .unwrap_err();

        let (summary, source) = match err {
            PipelineError::UnitsFailed { summary, source } => (summary, source),
            other => panic!("expected UnitsFailed, got {:?}", other),
        };
        assert!(matches!(*source, PipelineError::Unit { unit, .. } if unit == bad_shard));
        assert_eq!(summary.records_read, 40);
        assert_eq!(summary.failed_units, 1);
        assert_eq!(summary.dropped, routed_to_bad - 1);
        assert_eq!(summary.flagged, healthy.len());

        let mut delivered: Vec<String> = sink
            .flagged
            .iter()
            .map(|f| f.domain.domain_name.clone())
            .collect();
        delivered.sort();
        let mut expected = healthy.clone();
        expected.sort();
        assert_eq!(delivered, expected);
    }

    #[tokio::test]
    async fn sink_failure_stops_all_units() {
        let transport = Arc::new(MockTransport::new().flagging("MALWARE", "domain-0.test"));
        let mut source = VecSource::new(test_records(40));
        let mut sink = CollectingSink::failing();

        let err = run(&mut source, &mut sink, create_client(transport.clone()), &config(1, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Sink(_)));
        assert_eq!(sink.emits, 1);
        assert!(!sink.closed);
        // Only batches already queued when the sink failed were sent
        assert!(transport.call_count() <= 8, "sent {} batches", transport.call_count());
    }

    #[tokio::test]
    async fn source_error_stops_run() {
        let transport = Arc::new(MockTransport::new());
        let mut source = VecSource::new(test_records(2)).failing_after(1);
        let mut sink = CollectingSink::default();

        let err = run(&mut source, &mut sink, create_client(transport), &config(2, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Source { line: 2, .. }));
    }
}
