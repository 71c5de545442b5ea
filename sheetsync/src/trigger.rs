//! HTTP trigger for synchronization runs.
//!
//! `POST /sync` runs the pipeline once and answers when it finished. Runs are
//! serialized: a trigger arriving while a run is in progress gets
//! `409 Conflict` instead of queueing.

use crate::pipeline::{Pipeline, SyncJob};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::text_response;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SUCCESS_MESSAGE: &str = "Data has been added to the spreadsheets.\n";

struct Inner {
    pipeline: Pipeline,
    job: SyncJob,
    running: Mutex<()>,
}

#[derive(Clone)]
pub struct TriggerService {
    inner: Arc<Inner>,
}

impl TriggerService {
    pub fn new(pipeline: Pipeline, job: SyncJob) -> Self {
        TriggerService {
            inner: Arc::new(Inner {
                pipeline,
                job,
                running: Mutex::new(()),
            }),
        }
    }

    async fn sync(inner: Arc<Inner>) -> Response<Full<Bytes>> {
        let Ok(_guard) = inner.running.try_lock() else {
            tracing::warn!("Rejected trigger, a run is already in progress");
            return text_response(
                StatusCode::CONFLICT,
                "A synchronization run is already in progress.\n",
            );
        };

        match inner.pipeline.run_now(&inner.job).await {
            Ok(_) => text_response(StatusCode::OK, SUCCESS_MESSAGE),
            Err(e) => text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error updating spreadsheets: {e}\n"),
            ),
        }
    }
}

impl Service<Request<Incoming>> for TriggerService {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let inner = self.inner.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        Box::pin(async move {
            tracing::debug!(%method, %path, "Received request");
            let response = match (method, path.as_str()) {
                (Method::GET, "/health") => text_response(StatusCode::OK, "ok\n"),
                (Method::POST, "/sync") => Self::sync(inner).await,
                _ => text_response(StatusCode::NOT_FOUND, "not found\n"),
            };
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Documents;
    use collector::testutils::FixtureSource;
    use collector::{BridgingRecord, HostEndpoint, Payload, ResourceKind};
    use sheets::{Credential, MemoryBackend};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use url::Url;

    fn job() -> SyncJob {
        SyncJob {
            hosts: vec![HostEndpoint::new(
                Url::parse("http://app-1.internal:3000").unwrap(),
                Some("app-1".to_string()),
            )],
            documents: Documents {
                bridging: "doc-bridging".to_string(),
                insurance: "doc-bpjs".to_string(),
                registry: "doc-sehat".to_string(),
            },
            credential: Credential::new("test-token"),
        }
    }

    /// Serves the trigger on an ephemeral port.
    async fn start_trigger(source: FixtureSource) -> (u16, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = Pipeline::new(Arc::new(source), Arc::new(backend.clone()));
        let service = TriggerService::new(pipeline, job());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(shared::http::serve(listener, service));

        (port, backend)
    }

    fn bridging() -> Payload {
        Payload::Bridging(vec![BridgingRecord {
            facility_code: Some("K1".to_string()),
            ..Default::default()
        }])
    }

    #[tokio::test]
    async fn test_sync_success() {
        let (port, backend) =
            start_trigger(FixtureSource::new().with_payload("app-1", bridging())).await;

        let response = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/sync"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), SUCCESS_MESSAGE);
        assert_eq!(backend.titles("doc-bridging").len(), 1);
    }

    #[tokio::test]
    async fn test_sync_failure() {
        let (port, backend) = start_trigger(FixtureSource::new().with_failure(
            "app-1",
            ResourceKind::HealthRegistryBridging,
            StatusCode::SERVICE_UNAVAILABLE,
        ))
        .await;

        let response = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/sync"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body = response.text().await.unwrap();
        assert!(body.starts_with("Error updating spreadsheets:"));
        assert!(body.contains("app-1"));
        assert!(backend.writes().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_rejected() {
        let (port, _) = start_trigger(FixtureSource::new().with_delayed_payload(
            "app-1",
            bridging(),
            Duration::from_millis(300),
        ))
        .await;

        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{port}/sync");
        let first = tokio::spawn(client.post(&url).send());
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = client.post(&url).send().await.unwrap();

        assert_eq!(second.status(), 409);
        assert_eq!(first.await.unwrap().unwrap().status(), 200);
    }

    #[tokio::test]
    async fn test_health_and_unknown_routes() {
        let (port, _) = start_trigger(FixtureSource::new()).await;
        let client = reqwest::Client::new();

        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(health.status(), 200);
        assert_eq!(health.text().await.unwrap(), "ok\n");

        let missing = client
            .get(format!("http://127.0.0.1:{port}/sync"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }
}
