//! Shared fixtures for upload tests.

use std::time::Duration;

use docpush_firestore::{FirestoreClient, FirestoreConfig};
use docpush_models::{CredentialRecord, Document, DocumentValue};
use docpush_upload::{BatchUploader, UploadConfig};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRIVATE_KEY: &str = include_str!("../../../../testdata/service_account_key.pem");
pub const PROJECT_ID: &str = "demo-project";
pub const COLLECTION: &str = "users";

/// Matches document creates in the test collection.
pub const DOCUMENTS_PATH: &str = r"^/v1/projects/demo-project/databases/.+/documents/users$";

pub fn credential(server: &MockServer) -> CredentialRecord {
    CredentialRecord {
        account_type: "service_account".to_string(),
        project_id: PROJECT_ID.to_string(),
        private_key_id: "key-1".to_string(),
        // Key files store newlines escaped; the signer has to undo that.
        private_key: PRIVATE_KEY.replace('\n', "\\n"),
        client_email: "uploader@demo-project.iam.gserviceaccount.com".to_string(),
        client_id: "1234567890".to_string(),
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: format!("{}/token", server.uri()),
        auth_provider_x509_cert_url: None,
        client_x509_cert_url: None,
    }
}

pub fn uploader(server: &MockServer, batch_size: usize, batch_delay: Duration) -> BatchUploader {
    let config = FirestoreConfig::default().with_base_url(server.uri());
    let client = FirestoreClient::new(config).expect("client builds");
    BatchUploader::new(
        client,
        UploadConfig {
            batch_size,
            batch_delay,
            ..UploadConfig::default()
        },
    )
}

/// Like [`uploader`], but with a per-request timeout on the HTTP client.
pub fn uploader_with_timeout(server: &MockServer, batch_size: usize, timeout: Duration) -> BatchUploader {
    let config = FirestoreConfig {
        timeout,
        ..FirestoreConfig::default().with_base_url(server.uri())
    };
    let client = FirestoreClient::new(config).expect("client builds");
    BatchUploader::new(
        client,
        UploadConfig {
            batch_size,
            batch_delay: Duration::ZERO,
            ..UploadConfig::default()
        },
    )
}

/// `count` documents of the shape `{"index": i, "name": "user-i"}`.
pub fn documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            Document::from([
                ("index".to_string(), DocumentValue::Integer(i as i64)),
                ("name".to_string(), DocumentValue::from(format!("user-{i}"))),
            ])
        })
        .collect()
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.integration",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

pub fn created() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "name": "projects/demo-project/databases/(default)/documents/users/generated",
        "fields": {},
        "createTime": "2024-05-01T12:00:00.000000Z",
        "updateTime": "2024-05-01T12:00:00.000000Z"
    }))
}

/// Accept every document create, expecting exactly `count` of them.
pub async fn mount_documents(server: &MockServer, count: u64) {
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .respond_with(created())
        .expect(count)
        .mount(server)
        .await;
}
