//! Fan-out collection across hosts and resource kinds.
//!
//! Every (host, kind) pair is fetched in its own task. Results are buffered by
//! their position in the canonical order (hosts as configured, then kinds as
//! given) and only merged once every fetch succeeded, so the merged datasets
//! never depend on completion order. The first failure aborts the remaining
//! fetches and nothing is merged.

use crate::metrics_defs::{SOURCE_FETCH_FAILURES, SOURCE_RECORDS};
use crate::source::{FetchFailure, RecordSource, SourceUnavailable};
use crate::types::{Datasets, HostEndpoint, Payload, ResourceKind};
use shared::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Result of one fetch task, tagged with its merge position.
struct FetchResult {
    position: usize,
    result: Result<Payload, SourceUnavailable>,
}

pub struct Aggregator {
    source: Arc<dyn RecordSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    pub async fn collect(
        &self,
        hosts: &[HostEndpoint],
        kinds: &[ResourceKind],
    ) -> Result<Datasets, SourceUnavailable> {
        let mut join_set = JoinSet::new();
        // Maps task IDs to their (host, kind) so a panicked task can still be reported
        let mut task_targets = HashMap::new();
        let mut targets = Vec::with_capacity(hosts.len() * kinds.len());

        for host in hosts {
            for &kind in kinds {
                let position = targets.len();
                targets.push((host.name().to_string(), kind));

                let source = self.source.clone();
                let host = host.clone();
                let abort_handle = join_set.spawn(async move {
                    let result = source.fetch(&host, kind).await;
                    FetchResult { position, result }
                });
                task_targets.insert(abort_handle.id(), position);
            }
        }

        let mut slots: Vec<Option<Payload>> = targets.iter().map(|_| None).collect();

        while let Some(join_result) = join_set.join_next_with_id().await {
            let error = match join_result {
                Ok((_, FetchResult { position, result })) => match result {
                    Ok(payload) => {
                        let (host, kind) = &targets[position];
                        tracing::debug!(
                            host = %host,
                            kind = %kind,
                            records = payload.record_count(),
                            "Fetched resource"
                        );
                        histogram!(SOURCE_RECORDS, "kind" => kind.as_str())
                            .record(payload.record_count() as f64);
                        slots[position] = Some(payload);
                        continue;
                    }
                    Err(e) => e,
                },
                Err(join_error) => {
                    let (host, kind) = task_targets
                        .get(&join_error.id())
                        .map(|&position| targets[position].clone())
                        .unwrap_or_else(|| ("unknown".to_string(), ResourceKind::StatusBridging));
                    SourceUnavailable {
                        host,
                        kind,
                        cause: FetchFailure::Task(join_error.to_string()),
                    }
                }
            };

            tracing::error!(
                host = %error.host,
                kind = %error.kind,
                error = %error.cause,
                "Fetch failed, aborting {} outstanding fetches",
                join_set.len()
            );
            counter!(
                SOURCE_FETCH_FAILURES,
                "host" => error.host.clone(),
                "kind" => error.kind.as_str()
            )
            .increment(1);
            join_set.abort_all();
            return Err(error);
        }

        let mut datasets = Datasets::default();
        for payload in slots.into_iter().flatten() {
            datasets.merge(payload);
        }

        Ok(datasets)
    }
}
