//! Canned record sources for exercising the aggregator and the pipeline
//! without live hosts.

use crate::source::{FetchFailure, RecordSource, SourceUnavailable};
use crate::types::{HostEndpoint, Payload, ResourceKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

enum Outcome {
    Payload(Payload),
    Failure(StatusCode),
}

struct Fixture {
    delay: Duration,
    outcome: Outcome,
}

/// Serves fixed payloads keyed by host name and resource kind.
///
/// Pairs without a fixture answer with an empty payload. Every fetch is
/// recorded in call order.
#[derive(Default)]
pub struct FixtureSource {
    fixtures: HashMap<(String, ResourceKind), Fixture>,
    calls: Mutex<Vec<(String, ResourceKind)>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(self, host: &str, payload: Payload) -> Self {
        self.with_delayed_payload(host, payload, Duration::ZERO)
    }

    /// Answers after `delay`, to simulate slow hosts.
    pub fn with_delayed_payload(mut self, host: &str, payload: Payload, delay: Duration) -> Self {
        self.fixtures.insert(
            (host.to_string(), payload.kind()),
            Fixture {
                delay,
                outcome: Outcome::Payload(payload),
            },
        );
        self
    }

    pub fn with_failure(mut self, host: &str, kind: ResourceKind, status: StatusCode) -> Self {
        self.fixtures.insert(
            (host.to_string(), kind),
            Fixture {
                delay: Duration::ZERO,
                outcome: Outcome::Failure(status),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<(String, ResourceKind)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordSource for FixtureSource {
    async fn fetch(
        &self,
        host: &HostEndpoint,
        kind: ResourceKind,
    ) -> Result<Payload, SourceUnavailable> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((host.name().to_string(), kind));
        }

        let Some(fixture) = self.fixtures.get(&(host.name().to_string(), kind)) else {
            return Ok(Payload::empty(kind));
        };

        if !fixture.delay.is_zero() {
            tokio::time::sleep(fixture.delay).await;
        }

        match &fixture.outcome {
            Outcome::Payload(payload) => Ok(payload.clone()),
            Outcome::Failure(status) => Err(SourceUnavailable {
                host: host.name().to_string(),
                kind,
                cause: FetchFailure::Status(*status),
            }),
        }
    }
}
