//! # Domain Errors
//!
//! Error types for topic history retrieval.
//!
//! Input problems that have a documented fallback (zero limit, zero `from`,
//! future `since`) are corrected in place and never surface here. Everything
//! below aborts the request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the history read paths.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// None of the requested topics is readable by the identity.
    #[error("Identity {identity} is not authorized for any requested topic")]
    Unauthorized {
        /// Caller identity used for the lookup
        identity: String,
    },

    /// A requested topic is empty or carries wildcard characters.
    #[error("Invalid topic: {0:?}")]
    InvalidTopic(String),

    /// The request named no topic at all.
    #[error("No topics requested")]
    NoTopics,

    /// The authorization lookup itself could not be performed.
    #[error("Authorization lookup failed: {0}")]
    AuthSource(#[from] AuthSourceError),

    /// The message store failed for one topic of the batch.
    #[error("Store error on topic {topic}: {source}")]
    Store {
        /// Topic whose retrieval failed
        topic: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The caller-supplied deadline passed before the fan-out completed.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// A fan-out task panicked or was aborted.
    #[error("Fan-out task failed: {0}")]
    TaskFailed(String),
}

impl HistoryError {
    /// Wrap a store failure with the topic it happened on.
    pub fn store(topic: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            topic: topic.into(),
            source,
        }
    }

    /// Coarse classification for transport mapping.
    pub fn kind(&self) -> HistoryErrorKind {
        match self {
            Self::Unauthorized { .. } => HistoryErrorKind::Unauthorized,
            Self::InvalidTopic(_) | Self::NoTopics => HistoryErrorKind::InvalidInput,
            Self::AuthSource(_) => HistoryErrorKind::AuthSource,
            Self::Store { .. } | Self::TaskFailed(_) => HistoryErrorKind::Store,
            Self::Cancelled | Self::DeadlineExceeded => HistoryErrorKind::Cancelled,
        }
    }
}

/// Error classification exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryErrorKind {
    /// Rejected, not retried.
    Unauthorized,
    /// Malformed request that has no fallback value.
    InvalidInput,
    /// Backing store failure.
    Store,
    /// Authorization source failure.
    AuthSource,
    /// Caller cancelled or deadline passed.
    Cancelled,
}

/// Message store failures.
///
/// Opaque to the core except for [`StoreError::NotFound`], which the
/// aggregator treats as an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Nothing stored for the requested key.
    #[error("Not found")]
    NotFound,

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the query.
    #[error("Query failed: {0}")]
    Query(String),

    /// A stored row could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The call observed the request context being cancelled.
    #[error("Store call cancelled")]
    Cancelled,
}

impl StoreError {
    /// Whether this error means "no data" rather than a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Authorization source failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthSourceError {
    /// The ACL backend could not be reached.
    #[error("ACL source unavailable: {0}")]
    Unavailable(String),

    /// The ACL lookup failed.
    #[error("ACL query failed: {0}")]
    Query(String),

    /// The call observed the request context being cancelled.
    #[error("ACL lookup cancelled")]
    Cancelled,
}
