//! Grouped writes, failure isolation and progress.

use std::time::{Duration, Instant};

use docpush_models::{Document, DocumentValue, LogKind, UploadState};
use docpush_upload::{ProgressEvent, ProgressReporter};
use wiremock::matchers::{body_string_contains, header, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::support::{
    created, credential, documents, mount_documents, mount_token, uploader,
    uploader_with_timeout, COLLECTION, DOCUMENTS_PATH,
};

#[tokio::test]
async fn test_all_documents_uploaded() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .and(header("authorization", "Bearer ya29.integration"))
        .respond_with(created())
        .expect(3)
        .mount(&server)
        .await;

    let mut reporter = ProgressReporter::new();
    let summary = uploader(&server, 5, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &documents(3), &mut reporter)
        .await
        .unwrap();

    assert!(summary.all_succeeded());
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.progress.completed, 3);
    assert_eq!(summary.progress.percentage, 100);
    assert_eq!(reporter.state(), UploadState::Completed);
    assert_eq!(reporter.count(LogKind::Success), 3);

    let success = reporter
        .entries()
        .find(|e| e.kind == LogKind::Success)
        .unwrap();
    assert!(success.details.as_deref().unwrap().ends_with("/documents/users/generated"));
}

#[tokio::test]
async fn test_groups_and_pauses() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_documents(&server, 12).await;

    let delay = Duration::from_millis(250);
    let mut reporter = ProgressReporter::new();
    let started = Instant::now();
    let summary = uploader(&server, 5, delay)
        .upload(COLLECTION, &credential(&server), &documents(12), &mut reporter)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // 5 + 5 + 2 documents, with a pause between consecutive groups only.
    assert_eq!(summary.groups, 3);
    assert_eq!(summary.progress.completed, 12);
    assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 3, "elapsed {elapsed:?}");

    // Walk the log oldest first: the first group starts right after the
    // upload begins, and exactly two gaps of a full pause separate writes.
    let delay_ms = delay.as_millis() as i64;
    let log: Vec<_> = reporter.into_log().into_iter().rev().collect();
    let start = log
        .iter()
        .find(|e| e.message.starts_with("Uploading"))
        .unwrap();
    let writes: Vec<_> = log.iter().filter(|e| e.kind == LogKind::Success).collect();
    assert_eq!(writes.len(), 12);
    assert!((writes[0].timestamp - start.timestamp).num_milliseconds() < delay_ms);

    let pauses = writes
        .windows(2)
        .filter(|w| (w[1].timestamp - w[0].timestamp).num_milliseconds() >= delay_ms)
        .count();
    assert_eq!(pauses, 2);
}

#[tokio::test]
async fn test_network_failure_fails_only_that_document() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .and(body_string_contains("\"stall\""))
        .respond_with(created().set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;
    mount_documents(&server, 5).await;

    let mut docs = documents(6);
    docs[2].insert("stall".to_string(), DocumentValue::Boolean(true));

    let mut reporter = ProgressReporter::new();
    let summary = uploader_with_timeout(&server, 3, Duration::from_millis(400))
        .upload(COLLECTION, &credential(&server), &docs, &mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.progress.completed, 5);
    assert_eq!(summary.progress.failed, 1);
    assert_eq!(summary.progress.percentage, 100);
    assert_eq!(reporter.state(), UploadState::Completed);

    let failure = reporter
        .entries()
        .find(|e| e.kind == LogKind::Error)
        .unwrap();
    assert_eq!(failure.message, "Document 3 failed");
    assert!(failure.details.as_deref().unwrap().starts_with("Network error"));
}

#[tokio::test]
async fn test_writes_in_a_group_run_concurrently() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .respond_with(created().set_delay(Duration::from_millis(300)))
        .expect(5)
        .mount(&server)
        .await;

    let mut reporter = ProgressReporter::new();
    let started = Instant::now();
    let summary = uploader(&server, 5, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &documents(5), &mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.progress.completed, 5);
    assert!(started.elapsed() < Duration::from_millis(1200));
}

#[tokio::test]
async fn test_server_error_fails_only_that_document() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .and(body_string_contains("\"poison\""))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .expect(1)
        .mount(&server)
        .await;
    mount_documents(&server, 5).await;

    let mut docs = documents(6);
    docs[3].insert("poison".to_string(), DocumentValue::Boolean(true));

    let mut reporter = ProgressReporter::new();
    let summary = uploader(&server, 2, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &docs, &mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.progress.completed, 5);
    assert_eq!(summary.progress.failed, 1);
    assert!(!summary.all_succeeded());
    assert_eq!(reporter.state(), UploadState::Completed);

    let failure = reporter
        .entries()
        .find(|e| e.kind == LogKind::Error)
        .unwrap();
    assert_eq!(failure.message, "Document 4 failed");
    assert!(failure.details.as_deref().unwrap().contains("backend exploded"));
}

#[tokio::test]
async fn test_malformed_geo_point_fails_before_sending() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_documents(&server, 2).await;

    let mut docs = documents(3);
    docs[1].insert("home".to_string(), DocumentValue::from("GeoPoint(abc)"));

    let mut reporter = ProgressReporter::new();
    let summary = uploader(&server, 5, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &docs, &mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.progress.completed, 2);
    assert_eq!(summary.progress.failed, 1);
    let failure = reporter
        .entries()
        .find(|e| e.kind == LogKind::Error)
        .unwrap();
    assert_eq!(failure.message, "Document 2 failed");
    assert!(failure.details.as_deref().unwrap().contains("GeoPoint"));
}

#[tokio::test]
async fn test_progress_is_monotonic_and_reaches_100() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_documents(&server, 7).await;

    let mut reporter = ProgressReporter::new();
    let mut events = reporter.subscribe();
    uploader(&server, 3, Duration::from_millis(10))
        .upload(COLLECTION, &credential(&server), &documents(7), &mut reporter)
        .await
        .unwrap();

    let mut percentages = Vec::new();
    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::Progress(p) => percentages.push(p.percentage),
            ProgressEvent::State(s) => states.push(s),
            ProgressEvent::Log(_) => {}
        }
    }

    assert!(percentages.windows(2).all(|w| w[0] <= w[1]), "{percentages:?}");
    assert_eq!(percentages.first(), Some(&0));
    assert_eq!(percentages.last(), Some(&100));
    assert_eq!(
        states,
        [
            UploadState::TokenAcquisition,
            UploadState::Uploading,
            UploadState::Completed
        ]
    );
}

#[tokio::test]
async fn test_empty_upload_completes_at_zero_percent() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_documents(&server, 0).await;

    let mut reporter = ProgressReporter::new();
    let summary = uploader(&server, 5, Duration::from_millis(200))
        .upload(COLLECTION, &credential(&server), &[], &mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.groups, 0);
    assert_eq!(summary.progress.total, 0);
    assert_eq!(summary.progress.percentage, 0);
    assert_eq!(reporter.state(), UploadState::Completed);
}

#[tokio::test]
async fn test_log_keeps_most_recent_entries() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_documents(&server, 150).await;

    let mut reporter = ProgressReporter::with_capacity(100);
    uploader(&server, 50, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &documents(150), &mut reporter)
        .await
        .unwrap();

    let log = reporter.into_log();
    assert_eq!(log.len(), 100);
    assert_eq!(log[0].kind, LogKind::Info);
    assert!(log[0].message.starts_with("Upload finished: 150 succeeded"));
}

#[tokio::test]
async fn test_sentinel_fields_share_one_timestamp() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(DOCUMENTS_PATH))
        .and(body_string_contains("\"timestampValue\""))
        .respond_with(created())
        .expect(1)
        .mount(&server)
        .await;

    let doc = Document::from([
        ("createdAt".to_string(), DocumentValue::from("Timestamp")),
        ("updatedAt".to_string(), DocumentValue::from("Timestamp")),
    ]);

    let mut reporter = ProgressReporter::new();
    let summary = uploader(&server, 5, Duration::ZERO)
        .upload(COLLECTION, &credential(&server), &[doc], &mut reporter)
        .await
        .unwrap();
    assert_eq!(summary.progress.completed, 1);

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.url.path().ends_with("/documents/users"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    let created_at = &body["fields"]["createdAt"]["timestampValue"];
    assert!(created_at.is_string());
    assert_eq!(created_at, &body["fields"]["updatedAt"]["timestampValue"]);
}
