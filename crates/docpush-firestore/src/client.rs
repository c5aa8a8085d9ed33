//! Firestore REST API client.
//!
//! Document-create client with:
//! - HTTP client tuning (pooling, timeouts)
//! - Bearer authentication with a caller-supplied token
//! - Observability (tracing spans, metrics)

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::{info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_request;
use crate::token::AccessToken;
use crate::types::{CreateDocumentRequest, Document, ErrorResponse, Value};

/// Public Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

/// Database used when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Scheme and host of the REST endpoint
    pub base_url: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("FIRESTORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Self {
            base_url: std::env::var("FIRESTORE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        }
    }

    /// Point the client at another host, e.g. an emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Check that `collection` names a collection: one id, or a
/// `collection/doc/collection` chain with an odd number of segments.
///
/// Ids may not be empty, `.` or `..`, and may not carry URL query or
/// fragment characters.
pub fn validate_collection_path(collection: &str) -> FirestoreResult<()> {
    let trimmed = collection.trim_matches('/');
    if trimmed.trim().is_empty() {
        return Err(FirestoreError::invalid_collection("collection name is empty"));
    }

    if let Some(c) = trimmed.chars().find(|c| matches!(c, '?' | '#') || c.is_control()) {
        return Err(FirestoreError::invalid_collection(format!(
            "'{}' contains disallowed character {:?}",
            collection, c
        )));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments
        .iter()
        .any(|s| s.trim().is_empty() || *s == "." || *s == "..")
    {
        return Err(FirestoreError::invalid_collection(format!(
            "'{}' has an empty or relative segment",
            collection
        )));
    }
    if segments.len() % 2 == 0 {
        return Err(FirestoreError::invalid_collection(format!(
            "'{}' names a document, not a collection",
            collection
        )));
    }

    Ok(())
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("docpush-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        Self::new(FirestoreConfig::from_env())
    }

    /// The underlying HTTP client, shared with the token exchange.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// URL of a collection's document list, which is also its create endpoint.
    ///
    /// `collection` is spliced in verbatim; callers check it with
    /// [`validate_collection_path`] first.
    pub fn collection_url(&self, project_id: &str, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            project_id,
            self.config.database_id,
            collection.trim_matches('/')
        )
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create a document with a server-assigned id.
    pub async fn create_document(
        &self,
        token: &AccessToken,
        project_id: &str,
        collection: &str,
        fields: BTreeMap<String, Value>,
    ) -> FirestoreResult<Document> {
        validate_collection_path(collection)?;
        let url = self.collection_url(project_id, collection);
        let body = CreateDocumentRequest { fields };

        self.execute_request("create_document", collection, async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(token.as_str())
                .json(&body)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let doc: Document = response.json().await?;
                    Ok(doc)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = info_span!("firestore_request", operation = %operation, collection = %collection);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), Self::error_message(&body))
    }

    /// Prefer the API's `error.message`; fall back to the raw body.
    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => match parsed.error.status {
                Some(code) => format!("{} ({})", parsed.error.message, code),
                None => parsed.error.message,
            },
            Err(_) => body.to_string(),
        }
    }
}
