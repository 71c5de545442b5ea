use crate::types::{HostEndpoint, Payload, ResourceKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch task did not complete: {0}")]
    Task(String),
}

/// A host could not deliver one of its resources.
#[derive(thiserror::Error, Debug)]
#[error("source {host} unavailable for {kind}: {cause}")]
pub struct SourceUnavailable {
    pub host: String,
    pub kind: ResourceKind,
    #[source]
    pub cause: FetchFailure,
}

/// Reads one resource from one host.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(
        &self,
        host: &HostEndpoint,
        kind: ResourceKind,
    ) -> Result<Payload, SourceUnavailable>;
}

/// Fetches resources over HTTP with `GET <host>/api/<resource>`.
///
/// There is no retry here. The optional timeout applies to each request as a
/// whole; without one a hung host blocks its fetch indefinitely.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpSource {
            client: builder.build()?,
        })
    }

    async fn get(&self, host: &HostEndpoint, kind: ResourceKind) -> Result<Payload, FetchFailure> {
        let response = self.client.get(host.resource_url(kind)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status));
        }

        let body = response.bytes().await?;
        Ok(Payload::decode(kind, &body)?)
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(
        &self,
        host: &HostEndpoint,
        kind: ResourceKind,
    ) -> Result<Payload, SourceUnavailable> {
        self.get(host, kind)
            .await
            .map_err(|cause| SourceUnavailable {
                host: host.name().to_string(),
                kind,
                cause,
            })
    }
}
