//! Record source for the REST door-record service.
//!
//! Only URL layout and response decoding live here; the request itself goes
//! through an [`HttpClient`] supplied by the host.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::record::{ChangeRecord, WireRecord};
use crate::source::RecordSource;
use parking_lot::RwLock;
use std::time::Duration;

/// Blocking HTTP GET, provided by the host.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    ///
    /// The request must fail once `timeout` has elapsed.
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, String>;

    /// Returns false when the client knows the service is unreachable.
    fn is_healthy(&self) -> bool;
}

/// Record source reading door records from a REST endpoint.
///
/// Uses JSON response bodies:
/// - `GET {base}/doors/project/{project_id}` for the full history
/// - `GET {base}/doors/project/{project_id}/newer/{since}` for records
///   modified at or after `since`
pub struct HttpRecordSource<C: HttpClient> {
    /// Base URL of the record database (e.g., "http://localhost:3001/api/v1").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Timeout for each request.
    timeout: Duration,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpRecordSource<C> {
    /// Creates a new HTTP record source.
    pub fn new(base_url: impl Into<String>, client: C, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
            last_error: RwLock::new(None),
        }
    }

    /// Creates a source from the configured `source_url` and `fetch_timeout`.
    pub fn from_config(config: &SyncConfig, client: C) -> SyncResult<Self> {
        let url = config
            .source_url
            .as_deref()
            .ok_or_else(|| SyncError::configuration("source_url is not set"))?;
        Ok(Self::new(url, client, config.fetch_timeout))
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Builds the request URL for a fetch.
    ///
    /// The project identifier becomes a path segment, so it may only use
    /// URL-unreserved characters (`A-Z a-z 0-9 - . _ ~`).
    pub fn records_url(&self, project_id: &str, since: u64) -> SyncResult<String> {
        let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
        if project_id.is_empty() || !project_id.chars().all(unreserved) {
            return Err(SyncError::configuration(format!(
                "project identifier '{project_id}' is not a valid URL path segment"
            )));
        }

        Ok(if since == 0 {
            format!("{}/doors/project/{}", self.base_url, project_id)
        } else {
            format!("{}/doors/project/{}/newer/{}", self.base_url, project_id, since)
        })
    }
}

impl<C: HttpClient> RecordSource for HttpRecordSource<C> {
    fn fetch_records(&self, project_id: &str, since: u64) -> SyncResult<Vec<ChangeRecord>> {
        if !self.client.is_healthy() {
            return Err(SyncError::source_unavailable("http client not healthy"));
        }

        let url = self.records_url(project_id, since)?;
        let body = self.client.get(&url, self.timeout).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            SyncError::source_unavailable(format!("GET {url}: {e}"))
        })?;

        *self.last_error.write() = None;

        let wire: Vec<WireRecord> = serde_json::from_slice(&body)
            .map_err(|e| SyncError::Decode(format!("failed to decode response: {e}")))?;

        tracing::debug!(url = %url, records = wire.len(), "fetched records");

        wire.into_iter()
            .map(WireRecord::into_change_record)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestClient {
        response: RwLock<Result<Vec<u8>, String>>,
        healthy: AtomicBool,
        urls: RwLock<Vec<String>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(Err("No response set".into())),
                healthy: AtomicBool::new(true),
                urls: RwLock::new(Vec::new()),
            }
        }

        fn set_response(&self, resp: &str) {
            *self.response.write() = Ok(resp.as_bytes().to_vec());
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }
    }

    impl HttpClient for TestClient {
        fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, String> {
            self.urls.write().push(url.to_string());
            self.response.read().clone()
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn source(client: TestClient) -> HttpRecordSource<TestClient> {
        HttpRecordSource::new(
            "http://localhost:3001/api/v1/",
            client,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn records_url() {
        let source = source(TestClient::new());
        assert_eq!(source.base_url(), "http://localhost:3001/api/v1");
        assert_eq!(
            source.records_url("p1", 0).unwrap(),
            "http://localhost:3001/api/v1/doors/project/p1"
        );
        assert_eq!(
            source.records_url("p1", 1442940645).unwrap(),
            "http://localhost:3001/api/v1/doors/project/p1/newer/1442940645"
        );
    }

    #[test]
    fn unsafe_project_id_is_rejected() {
        let source = source(TestClient::new());
        assert!(source
            .records_url("8764c510-57b7-11e5-8b2c-9bc9d0c0ce00", 0)
            .is_ok());

        for project_id in ["a/b", "p1?x=1", "my project", "p%20"] {
            let result = source.records_url(project_id, 0);
            assert!(
                matches!(result, Err(SyncError::Configuration(_))),
                "{project_id} accepted"
            );
        }

        // Rejected before any request is sent
        assert!(source.fetch_records("a/b", 0).is_err());
        assert!(source.client.urls.read().is_empty());
    }

    #[test]
    fn from_config() {
        let config = SyncConfig::default()
            .with_source_url("http://db.example/api/v1")
            .with_fetch_timeout(Duration::from_secs(3));
        let source = HttpRecordSource::from_config(&config, TestClient::new()).unwrap();
        assert_eq!(source.base_url(), "http://db.example/api/v1");
        assert_eq!(source.timeout, Duration::from_secs(3));

        let result = HttpRecordSource::from_config(&SyncConfig::default(), TestClient::new());
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[test]
    fn fetch_decodes_records() {
        let client = TestClient::new();
        client.set_response(
            r#"[{"_id": "A1", "project_id": "p1", "level": "Level 1", "tag": "FR90", "firerating": 90, "modified": 100}]"#,
        );
        let source = source(client);

        let records = source.fetch_records("p1", 50).unwrap();
        assert_eq!(records, vec![ChangeRecord::new("A1", 90.0, "FR90", 100)]);
        assert_eq!(
            source.client.urls.read()[0],
            "http://localhost:3001/api/v1/doors/project/p1/newer/50"
        );
    }

    #[test]
    fn client_failure_is_source_unavailable() {
        let source = source(TestClient::new());

        let result = source.fetch_records("p1", 0);
        assert!(matches!(result, Err(SyncError::SourceUnavailable { .. })));
        assert_eq!(source.last_error().as_deref(), Some("No response set"));
    }

    #[test]
    fn unhealthy_client() {
        let client = TestClient::new();
        client.set_healthy(false);
        let source = source(client);

        let result = source.fetch_records("p1", 0);
        assert!(matches!(result, Err(SyncError::SourceUnavailable { .. })));
        assert!(source.client.urls.read().is_empty());
    }

    #[test]
    fn invalid_body_is_decode_error() {
        let client = TestClient::new();
        client.set_response("<html>502 Bad Gateway</html>");
        let source = source(client);

        let result = source.fetch_records("p1", 0);
        assert!(matches!(result, Err(SyncError::Decode(_))));
    }
}
