//! Shared data models for DocPush.
//!
//! This crate provides Serde-serializable types for:
//! - Service account credentials
//! - Dynamically-typed documents parsed from JSON
//! - Upload progress counters and log entries

pub mod credential;
pub mod document;
pub mod progress;

// Re-export common types
pub use credential::{CredentialError, CredentialRecord, SERVICE_ACCOUNT_TYPE};
pub use document::{Document, DocumentValue};
pub use progress::{LogKind, UploadLogEntry, UploadProgress, UploadState};
