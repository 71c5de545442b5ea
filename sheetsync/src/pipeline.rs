//! One synchronization run: authorize, collect from every host, then create
//! and append the five dated target sheets in a fixed order.
//!
//! Any failure stops the run. Targets written before the failure stay written
//! and are logged so an operator can tell what landed.

use crate::config::Documents;
use crate::errors::SyncError;
use crate::metrics_defs::{ROWS_WRITTEN, SYNC_DURATION, SYNC_RUNS};
use chrono::{DateTime, Local, NaiveDate, Utc};
use collector::{Aggregator, HostEndpoint, RecordSource, ResourceKind};
use shared::row::Row;
use shared::{counter, histogram};
use sheets::{
    AccessToken, AppendSummary, Credential, GoogleSheetsClient, MemoryBackend, RowWriter,
    SheetError, SheetManager, SheetNames, SheetStatus, SpreadsheetBackend,
};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Everything one run is parameterized by.
#[derive(Clone, Debug)]
pub struct SyncJob {
    pub hosts: Vec<HostEndpoint>,
    pub documents: Documents,
    pub credential: Credential,
}

/// Opens a spreadsheet backend for an authorized run.
pub trait BackendConnector: Send + Sync {
    fn connect(&self, token: AccessToken) -> Arc<dyn SpreadsheetBackend>;
}

pub struct GoogleConnector {
    base_url: Url,
}

impl GoogleConnector {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl BackendConnector for GoogleConnector {
    fn connect(&self, token: AccessToken) -> Arc<dyn SpreadsheetBackend> {
        Arc::new(GoogleSheetsClient::new(self.base_url.clone(), token))
    }
}

// Dry runs and tests share one in-memory backend across runs
impl BackendConnector for Arc<MemoryBackend> {
    fn connect(&self, _token: AccessToken) -> Arc<dyn SpreadsheetBackend> {
        self.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetReport {
    pub document_id: String,
    pub sheet_name: String,
    pub sheet: SheetStatus,
    /// `None` when there were no records for this target.
    pub appended: Option<AppendSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub targets: Vec<TargetReport>,
}

impl SyncReport {
    pub fn rows_written(&self) -> usize {
        self.targets
            .iter()
            .filter_map(|target| target.appended)
            .map(|summary| summary.records)
            .sum()
    }

    fn describe_targets(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|target| format!("{}/{}", target.document_id, target.sheet_name))
            .collect()
    }
}

struct Targets {
    manager: SheetManager,
    writer: RowWriter,
}

impl Targets {
    async fn sync<R: Row + Sync>(
        &self,
        document_id: &str,
        sheet_name: &str,
        records: &[R],
    ) -> Result<TargetReport, SheetError> {
        let sheet = self.manager.ensure_sheet(document_id, sheet_name).await?;
        let appended = self.writer.append(document_id, sheet_name, records).await?;

        Ok(TargetReport {
            document_id: document_id.to_string(),
            sheet_name: sheet_name.to_string(),
            sheet,
            appended,
        })
    }
}

pub struct Pipeline {
    source: Arc<dyn RecordSource>,
    connector: Arc<dyn BackendConnector>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn RecordSource>, connector: Arc<dyn BackendConnector>) -> Self {
        Pipeline { source, connector }
    }

    /// Runs against the local calendar date and the current time.
    pub async fn run_now(&self, job: &SyncJob) -> Result<SyncReport, SyncError> {
        self.run(job, Local::now().date_naive(), Utc::now()).await
    }

    pub async fn run(
        &self,
        job: &SyncJob,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let result = self.run_inner(job, today, now).await;
        histogram!(SYNC_DURATION).record(started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => {
                counter!(SYNC_RUNS, "outcome" => "success").increment(1);
                counter!(ROWS_WRITTEN).increment(report.rows_written() as u64);
                tracing::info!(
                    targets = report.targets.len(),
                    rows = report.rows_written(),
                    "Synchronization finished"
                );
            }
            Err(e) => {
                counter!(SYNC_RUNS, "outcome" => "failure", "operation" => e.operation())
                    .increment(1);
                tracing::error!(operation = e.operation(), error = %e, "Synchronization failed");
            }
        }

        result
    }

    async fn run_inner(
        &self,
        job: &SyncJob,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, SyncError> {
        if job.hosts.is_empty() {
            return Err(SyncError::ConfigurationMissing("hosts".to_string()));
        }
        if let Some(name) = job.documents.missing() {
            return Err(SyncError::ConfigurationMissing(name.to_string()));
        }

        let token = job.credential.authorize(now)?;

        let datasets = Aggregator::new(self.source.clone())
            .collect(&job.hosts, &ResourceKind::ALL)
            .await?;

        let names = SheetNames::for_date(today);
        let backend = self.connector.connect(token);
        let targets = Targets {
            manager: SheetManager::new(backend.clone()),
            writer: RowWriter::new(backend),
        };

        let mut report = SyncReport::default();
        let documents = &job.documents;
        let written: Result<(), SheetError> = async {
            report.targets.push(
                targets
                    .sync(&documents.bridging, &names.snapshot, &datasets.bridging)
                    .await?,
            );
            report.targets.push(
                targets
                    .sync(&documents.insurance, &names.weekly, &datasets.insurance.weekly)
                    .await?,
            );
            report.targets.push(
                targets
                    .sync(&documents.insurance, &names.alltime, &datasets.insurance.alltime)
                    .await?,
            );
            report.targets.push(
                targets
                    .sync(&documents.registry, &names.weekly, &datasets.registry.weekly)
                    .await?,
            );
            report.targets.push(
                targets
                    .sync(&documents.registry, &names.alltime, &datasets.registry.alltime)
                    .await?,
            );
            Ok(())
        }
        .await;

        if let Err(e) = written {
            if !report.targets.is_empty() {
                tracing::warn!(
                    completed = ?report.describe_targets(),
                    "Stopped after a partial write"
                );
            }
            return Err(e.into());
        }

        Ok(report)
    }
}
