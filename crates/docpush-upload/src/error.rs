//! Upload error types.
//!
//! Only pre-flight failures surface here. Per-document failures are counted
//! and logged by the uploader instead.

use docpush_firestore::FirestoreError;
use docpush_models::CredentialError;
use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid credential: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    InvalidCollection(FirestoreError),

    #[error("Authentication failed: {0}")]
    Authentication(#[from] FirestoreError),
}
