//! # Topic History
//!
//! Time-bucketed retrieval of historical messages published on MQTT-style
//! topics.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Serve the recent history of one or many topics to an authorized caller:
//! - Timestamps map to 3-day storage buckets counted from 2018-01-01
//! - Topic reads are authorized against exact and single-level wildcard grants
//! - Multi-topic reads fan out concurrently and merge in request order
//!
//! ## Read Paths
//!
//! | Path | Window | Default limit |
//! |------|--------|---------------|
//! | Single topic | latest before `from` | `default_limit` |
//! | Multi topic | latest before `from`, per topic | `default_limit` |
//! | Since | `[since, from]`, future `since` falls back | `since_default_limit` |
//! | Window | `[to, from]` with document filters | `default_limit` |
//!
//! ## Module Structure
//!
//! ```text
//! topic-history/
//! ├── domain/          # Bucket clock, topics, messages, request context, errors
//! ├── algorithms/      # Authorization matching, normalization, merge
//! ├── ports/           # API trait (inbound) + store/ACL/clock traits (outbound)
//! ├── application/     # TopicAuthorizer, HistoryAggregator, HistoryService
//! ├── adapters/        # Bucketed and windowed stores, in-memory drivers
//! ├── metrics.rs       # Prometheus metrics (feature "metrics")
//! └── config.rs        # HistoryConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
#[allow(missing_docs)]
pub mod test_utils;

// Re-exports
pub use adapters::{
    BucketedMessageStore, InMemoryAclSource, InMemoryBucketStore, InMemoryWindowStore,
    WindowedMessageStore,
};
pub use algorithms::{candidate_patterns, merge_in_request_order, select_authorized};
pub use application::{HistoryAggregator, HistoryService, TopicAuthorizer};
pub use config::{ConfigError, HistoryConfig};
pub use domain::{
    Authorization, AuthSourceError, Bucket, BucketClock, ContextDone, HistoryError,
    HistoryErrorKind, Message, MessageFilters, MessageRecord, Payload, PlayerId, QueryAnomaly,
    RequestContext, StoreError, TopicWindow, BUCKET_SIZE_SECS, DEFAULT_BUCKET_QUANTITY,
    DEFAULT_LIMIT, EPOCH_START, FUTURE_SINCE_FALLBACK_LIMIT,
};
pub use ports::{
    AnomalyReporter, AuthorizationSource, BucketStore, HistoryApi, MessageStore,
    SystemTimeSource, TimeSource, TracingAnomalyReporter, WindowStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
