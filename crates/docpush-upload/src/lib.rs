//! Document upload engine.
//!
//! This crate provides:
//! - `BatchUploader`: bounded-concurrency uploads with per-document failure isolation
//! - `ProgressReporter`: live counters plus a bounded, most-recent-first log
//! - JSONL ingestion for document files
//! - Upload tuning via `UploadConfig`

pub mod config;
pub mod error;
pub mod jsonl;
pub mod progress;
pub mod uploader;

pub use config::UploadConfig;
pub use error::{UploadError, UploadResult};
pub use jsonl::{parse_jsonl, read_jsonl_file, JsonlBatch, JsonlLineError};
pub use progress::{ProgressEvent, ProgressReporter};
pub use uploader::{BatchUploader, UploadSummary};
