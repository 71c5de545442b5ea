//! Google Sheets v4 REST client.

use crate::auth::AccessToken;
use crate::backend::{BackendError, Grid, SpreadsheetBackend};
use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    // Omitted by the API when the range holds no values
    #[serde(default)]
    values: Grid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Grid,
}

pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: Url,
    token: AccessToken,
}

impl GoogleSheetsClient {
    /// `base_url` is the spreadsheets collection, normally [`DEFAULT_API_URL`].
    pub fn new(base_url: Url, token: AccessToken) -> Self {
        GoogleSheetsClient {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    async fn sheet_titles(&self, document_id: &str) -> Result<Vec<String>, BackendError> {
        let mut url = self.endpoint(&[document_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let metadata = Self::check(response)
            .await?
            .json::<SpreadsheetMetadata>()
            .await?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&[&format!("{document_id}:batchUpdate")])?;
        let body = serde_json::json!({
            "requests": [
                {"addSheet": {"properties": {"title": title}}}
            ]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn read_range(&self, document_id: &str, range: &str) -> Result<Grid, BackendError> {
        let url = self.endpoint(&[document_id, "values", range])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let value_range = Self::check(response).await?.json::<ValueRange>().await?;

        Ok(value_range.values)
    }

    async fn write_range(
        &self,
        document_id: &str,
        range: &str,
        values: Grid,
    ) -> Result<(), BackendError> {
        let mut url = self.endpoint(&[document_id, "values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credential;
    use chrono::Utc;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use hyper::{Request, StatusCode};
    use hyper_util::rt::TokioExecutor;
    use serde_json::{Value, json};
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[derive(Clone, Debug)]
    struct Recorded {
        method: String,
        path_and_query: String,
        authorization: Option<String>,
        body: Value,
    }

    /// Start a mock Sheets API that records every request and answers with
    /// `respond(method, path)` with spaces decoded.
    async fn start_mock_api<F>(respond: F) -> (u16, Arc<Mutex<Vec<Recorded>>>)
    where
        F: Fn(&str, &str) -> (u16, Value) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let log = recorded.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                let log = log.clone();
                let respond = respond.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let log = log.clone();
                        let respond = respond.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let bytes = body.collect().await.unwrap().to_bytes();
                            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                            let path_and_query = parts
                                .uri
                                .path_and_query()
                                .map(|pq| pq.as_str().to_string())
                                .unwrap_or_default();
                            // Sheet names in these tests only need spaces decoded
                            let decoded_path = parts.uri.path().replace("%20", " ");

                            log.lock().unwrap().push(Recorded {
                                method: parts.method.to_string(),
                                path_and_query,
                                authorization: parts
                                    .headers
                                    .get("authorization")
                                    .map(|v| v.to_str().unwrap().to_string()),
                                body,
                            });

                            let (status, reply) = respond(parts.method.as_str(), &decoded_path);
                            let mut response = hyper::Response::new(Full::new(Bytes::from(
                                serde_json::to_vec(&reply).unwrap(),
                            )));
                            *response.status_mut() = StatusCode::from_u16(status).unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        (port, recorded)
    }

    fn client(port: u16) -> GoogleSheetsClient {
        let token = Credential::new("test-token").authorize(Utc::now()).unwrap();
        GoogleSheetsClient::new(
            Url::parse(&format!("http://127.0.0.1:{port}/v4/spreadsheets/")).unwrap(),
            token,
        )
    }

    #[tokio::test]
    async fn test_sheet_titles() {
        let (port, recorded) = start_mock_api(|_, _| {
            (
                200,
                json!({"sheets": [
                    {"properties": {"title": "Alltime"}},
                    {"properties": {"title": "13 - 20 May 2024"}}
                ]}),
            )
        })
        .await;

        let titles = client(port).sheet_titles("doc-1").await.unwrap();
        assert_eq!(titles, vec!["Alltime", "13 - 20 May 2024"]);

        let requests = recorded.lock().unwrap().clone();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].path_and_query,
            "/v4/spreadsheets/doc-1?fields=sheets.properties.title"
        );
        assert_eq!(
            requests[0].authorization.as_deref(),
            Some("Bearer test-token")
        );
    }

    #[tokio::test]
    async fn test_create_sheet() {
        let (port, recorded) = start_mock_api(|_, _| (200, json!({"replies": [{}]}))).await;

        client(port)
            .create_sheet("doc-1", "13 - 20 May 2024")
            .await
            .unwrap();

        let requests = recorded.lock().unwrap().clone();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path_and_query, "/v4/spreadsheets/doc-1:batchUpdate");
        assert_eq!(
            requests[0].body,
            json!({"requests": [{"addSheet": {"properties": {"title": "13 - 20 May 2024"}}}]})
        );
    }

    #[tokio::test]
    async fn test_read_and_write_range() {
        let (port, recorded) = start_mock_api(|method, path| match (method, path) {
            ("GET", path) if path.ends_with("/values/'All Time (20 May 2024)'!A:A") => (
                200,
                json!({"range": "'All Time (20 May 2024)'!A1:A2", "values": [["Nama Faskes"], ["A"]]}),
            ),
            ("PUT", _) => (200, json!({"updatedRows": 1})),
            _ => (404, json!({})),
        })
        .await;

        let client = client(port);
        let values = client
            .read_range("doc-1", "'All Time (20 May 2024)'!A:A")
            .await
            .unwrap();
        assert_eq!(values.len(), 2);

        client
            .write_range(
                "doc-1",
                "'All Time (20 May 2024)'!A3:B3",
                vec![vec![json!("B"), json!(true)]],
            )
            .await
            .unwrap();

        let requests = recorded.lock().unwrap().clone();
        assert_eq!(requests[1].method, "PUT");
        assert!(requests[1].path_and_query.ends_with("?valueInputOption=RAW"));
        assert_eq!(
            requests[1].body,
            json!({
                "range": "'All Time (20 May 2024)'!A3:B3",
                "majorDimension": "ROWS",
                "values": [["B", true]]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_range() {
        let (port, _) = start_mock_api(|_, _| (200, json!({"range": "Sheet!A1:A1000"}))).await;

        let values = client(port).read_range("doc-1", "Sheet!A:A").await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_error_status() {
        let (port, _) = start_mock_api(|_, _| {
            (
                400,
                json!({"error": {"message": "A sheet with the name already exists"}}),
            )
        })
        .await;

        let err = client(port)
            .create_sheet("doc-1", "Alltime")
            .await
            .unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("already exists"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
