//! # History Metrics
//!
//! Prometheus metrics for the history read paths.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! topic-history = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `topic_history_requests_total` - Counter of requests (by route)
//! - `topic_history_unauthorized_total` - Counter of requests with no readable topic
//! - `topic_history_query_anomalies_total` - Counter of corrected inputs (by kind)
//! - `topic_history_store_errors_total` - Counter of store failures (by backend)
//! - `topic_history_fan_out_width` - Histogram of topics queried per request

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Requests served, labeled by route
    pub static ref REQUESTS: IntCounterVec = register_int_counter_vec!(
        "topic_history_requests_total",
        "Total number of history requests",
        &["route"]
    )
    .expect("Failed to create REQUESTS metric");

    /// Requests rejected because no topic was readable
    pub static ref UNAUTHORIZED: IntCounter = register_int_counter!(
        "topic_history_unauthorized_total",
        "Total number of requests with no authorized topic"
    )
    .expect("Failed to create UNAUTHORIZED metric");

    /// Corrected inputs, labeled by anomaly kind
    pub static ref QUERY_ANOMALIES: IntCounterVec = register_int_counter_vec!(
        "topic_history_query_anomalies_total",
        "Total number of malformed inputs that were corrected",
        &["kind"]
    )
    .expect("Failed to create QUERY_ANOMALIES metric");

    /// Store failures, labeled by backend
    pub static ref STORE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "topic_history_store_errors_total",
        "Total number of message store failures",
        &["backend"]
    )
    .expect("Failed to create STORE_ERRORS metric");

    /// Topics queried per request
    pub static ref FAN_OUT_WIDTH: Histogram = register_histogram!(
        "topic_history_fan_out_width",
        "Number of topics queried concurrently per request",
        vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .expect("Failed to create FAN_OUT_WIDTH metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a request on `route`
#[cfg(feature = "metrics")]
pub fn record_request(route: &str) {
    REQUESTS.with_label_values(&[route]).inc();
}

/// Record a request with no authorized topic
#[cfg(feature = "metrics")]
pub fn record_unauthorized() {
    UNAUTHORIZED.inc();
}

/// Record a corrected input
#[cfg(feature = "metrics")]
pub fn record_anomaly(kind: &str) {
    QUERY_ANOMALIES.with_label_values(&[kind]).inc();
}

/// Record a store failure
#[cfg(feature = "metrics")]
pub fn record_store_error(backend: &str) {
    STORE_ERRORS.with_label_values(&[backend]).inc();
}

/// Record how many topics one request fanned out to
#[cfg(feature = "metrics")]
pub fn record_fan_out_width(topics: usize) {
    FAN_OUT_WIDTH.observe(topics as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_request(_route: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_unauthorized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_anomaly(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_store_error(_backend: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fan_out_width(_topics: usize) {}
