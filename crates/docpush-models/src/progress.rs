//! Upload progress and log models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a single upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// Nothing started yet
    #[default]
    Idle,
    /// Signing the assertion and exchanging it for a bearer token
    TokenAcquisition,
    /// Writing documents group by group
    Uploading,
    /// Every group has been attempted
    Completed,
    /// A pre-flight failure stopped the upload before any write
    Aborted,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::TokenAcquisition => "token_acquisition",
            UploadState::Uploading => "uploading",
            UploadState::Completed => "completed",
            UploadState::Aborted => "aborted",
        }
    }

    /// True once the upload can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Aborted)
    }
}

/// Counter snapshot for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UploadProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// `round(100 * (completed + failed) / total)`, 0 when `total == 0`
    pub percentage: u8,
}

impl UploadProgress {
    pub fn new(completed: usize, failed: usize, total: usize) -> Self {
        Self {
            total,
            completed,
            failed,
            percentage: Self::percentage_of(completed + failed, total),
        }
    }

    /// Round-half-up percentage of `done` over `total`.
    fn percentage_of(done: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let done = done.min(total) as u128;
        let total = total as u128;
        ((200 * done + total) / (2 * total)) as u8
    }

    /// Documents that have settled either way.
    pub fn settled(&self) -> usize {
        self.completed + self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.settled() == self.total
    }
}

/// Kind of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Success,
    Error,
    Info,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Success => "success",
            LogKind::Error => "error",
            LogKind::Info => "info",
        }
    }
}

/// One entry of the upload log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl UploadLogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            details,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogKind::Success, message, None)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogKind::Info, message, None)
    }

    pub fn error(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(LogKind::Error, message, Some(details.into()))
    }
}
