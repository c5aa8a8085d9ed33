//! Upload configuration.

use std::time::Duration;

use crate::progress::DEFAULT_LOG_CAPACITY;

/// Upload tuning.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Documents written concurrently per group
    pub batch_size: usize,
    /// Fixed pause between groups
    pub batch_delay: Duration,
    /// Log entries kept by the reporter
    pub log_capacity: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(200),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl UploadConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            batch_size: std::env::var("DOCPUSH_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            batch_delay: Duration::from_millis(
                std::env::var("DOCPUSH_BATCH_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(200),
            ),
            log_capacity: std::env::var("DOCPUSH_LOG_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_CAPACITY),
        }
        .normalized()
    }

    /// Clamp sizes to at least one.
    pub fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.log_capacity = self.log_capacity.max(1);
        self
    }
}
