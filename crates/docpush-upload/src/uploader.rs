//! Batch upload orchestration.
//!
//! One upload call walks `Idle → TokenAcquisition → Uploading → Completed`,
//! or stops at `Aborted` when a pre-flight check or the token step fails. Documents
//! are written in fixed-size groups: every write in a group is in flight at
//! once, the group settles completely, then a fixed pause precedes the next
//! group. A failing document is counted and logged; its siblings carry on.

use docpush_firestore::{
    acquire_token, encode_document, validate_collection_path, AccessToken, FirestoreClient,
    FirestoreResult,
};
use docpush_models::{CredentialRecord, Document, UploadProgress, UploadState};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info_span, Instrument};

use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::progress::ProgressReporter;

/// Metric counting settled documents by outcome.
const DOCUMENTS_TOTAL: &str = "upload_documents_total";

/// Final outcome of an upload that got past authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub progress: UploadProgress,
    /// Groups attempted; pauses taken is one less
    pub groups: usize,
}

impl UploadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.progress.failed == 0
    }
}

/// Drives authenticated, grouped document writes.
#[derive(Clone)]
pub struct BatchUploader {
    client: FirestoreClient,
    config: UploadConfig,
}

impl BatchUploader {
    pub fn new(client: FirestoreClient, config: UploadConfig) -> Self {
        Self {
            client,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload `documents` into `collection` as the given service account.
    ///
    /// Resolves with final counters once every group has been attempted.
    /// Rejects without writing anything if the credential or collection is
    /// invalid or no token can be obtained; the reporter then holds one
    /// error entry.
    pub async fn upload(
        &self,
        collection: &str,
        credential: &CredentialRecord,
        documents: &[Document],
        reporter: &mut ProgressReporter,
    ) -> UploadResult<UploadSummary> {
        let span = info_span!("upload", collection = %collection, total = documents.len());
        self.run(collection, credential, documents, reporter)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        collection: &str,
        credential: &CredentialRecord,
        documents: &[Document],
        reporter: &mut ProgressReporter,
    ) -> UploadResult<UploadSummary> {
        let total = documents.len();
        reporter.update_progress(0, 0, total);
        reporter.set_state(UploadState::TokenAcquisition);

        let token = match self.preflight(collection, credential, reporter).await {
            Ok(token) => token,
            Err(e) => {
                reporter.error("Upload aborted before writing any document", e.to_string());
                reporter.set_state(UploadState::Aborted);
                return Err(e);
            }
        };

        reporter.set_state(UploadState::Uploading);
        reporter.info(format!(
            "Uploading {} documents to '{}' in groups of {}",
            total, collection, self.config.batch_size
        ));

        let mut completed = 0;
        let mut failed = 0;
        let mut groups = 0;

        for (group_idx, group) in documents.chunks(self.config.batch_size).enumerate() {
            if group_idx > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            groups += 1;
            debug!(group = group_idx + 1, size = group.len(), "Starting upload group");

            let offset = group_idx * self.config.batch_size;
            let mut in_flight: FuturesUnordered<_> = group
                .iter()
                .enumerate()
                .map(|(i, doc)| {
                    let token = &token;
                    let project_id = credential.project_id.as_str();
                    async move {
                        let result = self.write_document(token, project_id, collection, doc).await;
                        (offset + i + 1, result)
                    }
                })
                .collect();

            // Counters move as each write settles, not once per group.
            while let Some((position, result)) = in_flight.next().await {
                match result {
                    Ok(created) => {
                        completed += 1;
                        metrics::counter!(DOCUMENTS_TOTAL, "outcome" => "success").increment(1);
                        reporter.success(format!("Document {} uploaded", position), created.name);
                    }
                    Err(e) => {
                        failed += 1;
                        metrics::counter!(DOCUMENTS_TOTAL, "outcome" => "error").increment(1);
                        reporter.error(format!("Document {} failed", position), e.to_string());
                    }
                }
                reporter.update_progress(completed, failed, total);
            }
        }

        reporter.set_state(UploadState::Completed);
        reporter.info(format!(
            "Upload finished: {} succeeded, {} failed",
            completed, failed
        ));

        Ok(UploadSummary {
            progress: reporter.progress(),
            groups,
        })
    }

    /// Validate the inputs and trade the credential for a bearer token.
    async fn preflight(
        &self,
        collection: &str,
        credential: &CredentialRecord,
        reporter: &mut ProgressReporter,
    ) -> UploadResult<AccessToken> {
        credential.validate()?;
        validate_collection_path(collection).map_err(UploadError::InvalidCollection)?;
        reporter.info(format!("Authenticating as {}", credential.client_email));

        let token = acquire_token(self.client.http(), credential)
            .await
            .map_err(UploadError::Authentication)?;

        reporter.info("Access token acquired");
        Ok(token)
    }

    async fn write_document(
        &self,
        token: &AccessToken,
        project_id: &str,
        collection: &str,
        doc: &Document,
    ) -> FirestoreResult<docpush_firestore::Document> {
        let fields = encode_document(doc)?;
        self.client
            .create_document(token, project_id, collection, fields)
            .await
    }
}
