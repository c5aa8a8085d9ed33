//! Firestore metrics collection.
//!
//! Provides standardized metrics for monitoring Firestore traffic:
//! - Request counters by operation and status
//! - Latency histograms
//! - Token exchange counters

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total Firestore requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "firestore_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "firestore_latency_seconds";

    /// Token endpoint calls by HTTP status.
    pub const TOKEN_EXCHANGES_TOTAL: &str = "firestore_token_exchanges_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed Firestore request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let status_str = status.to_string();

    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_str
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a token endpoint response.
pub fn record_token_exchange(status: u16) {
    counter!(
        names::TOKEN_EXCHANGES_TOTAL,
        "status" => status.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
