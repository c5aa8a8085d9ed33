//! Upload progress reporting.
//!
//! The reporter is a passive recorder owned by one upload call. It keeps the
//! latest counters, the lifecycle state, and a log capped to the most recent
//! entries (newest first). Every change is also pushed to an optional
//! subscriber channel; sending never blocks and a dropped receiver is ignored.

use std::collections::VecDeque;

use docpush_models::{LogKind, UploadLogEntry, UploadProgress, UploadState};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Entries kept when no capacity is given.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// A change published to subscribers.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    State(UploadState),
    Progress(UploadProgress),
    Log(UploadLogEntry),
}

/// Counters, state and bounded log for one upload.
#[derive(Debug)]
pub struct ProgressReporter {
    progress: UploadProgress,
    state: UploadState,
    log: VecDeque<UploadLogEntry>,
    capacity: usize,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            progress: UploadProgress::default(),
            state: UploadState::Idle,
            log: VecDeque::with_capacity(capacity),
            capacity,
            events: None,
        }
    }

    /// Receive every subsequent change. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Record a log entry as the newest, evicting the oldest past capacity.
    pub fn emit(&mut self, kind: LogKind, message: impl Into<String>, details: Option<String>) {
        let entry = UploadLogEntry::new(kind, message, details);

        match entry.kind {
            LogKind::Error => warn!(
                details = entry.details.as_deref().unwrap_or(""),
                "{}", entry.message
            ),
            _ => info!(kind = entry.kind.as_str(), "{}", entry.message),
        }

        self.log.push_front(entry.clone());
        self.log.truncate(self.capacity);
        self.publish(ProgressEvent::Log(entry));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.emit(LogKind::Info, message, None);
    }

    pub fn success(&mut self, message: impl Into<String>, details: Option<String>) {
        self.emit(LogKind::Success, message, details);
    }

    pub fn error(&mut self, message: impl Into<String>, details: impl Into<String>) {
        self.emit(LogKind::Error, message, Some(details.into()));
    }

    /// Recompute the percentage and publish a new snapshot.
    pub fn update_progress(&mut self, completed: usize, failed: usize, total: usize) {
        debug_assert!(completed + failed <= total, "settled documents exceed total");
        self.progress = UploadProgress::new(completed, failed, total);
        self.publish(ProgressEvent::Progress(self.progress));
    }

    pub fn set_state(&mut self, state: UploadState) {
        self.state = state;
        self.publish(ProgressEvent::State(state));
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Log entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &UploadLogEntry> {
        self.log.iter()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.log.iter().filter(|e| e.kind == kind).count()
    }

    /// Consume the reporter, returning the log newest first.
    pub fn into_log(self) -> Vec<UploadLogEntry> {
        self.log.into()
    }

    fn publish(&self, event: ProgressEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}
