//! # Domain Value Objects
//!
//! Immutable request-scoped values passed between the service, the
//! aggregator and the stores.

use serde::{Deserialize, Serialize};

/// Resolved retrieval window for one topic.
///
/// `from` is the newest inclusive bound, `to` the oldest inclusive bound.
/// `to == None` means "no lower bound".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicWindow {
    /// Newest timestamp to include (Unix seconds).
    pub from: i64,
    /// Oldest timestamp to include (Unix seconds).
    pub to: Option<i64>,
    /// Maximum messages for this topic.
    pub limit: usize,
}

impl TopicWindow {
    /// Window without a lower bound.
    pub fn latest(from: i64, limit: usize) -> Self {
        Self {
            from,
            to: None,
            limit,
        }
    }

    /// Window bounded on both sides.
    pub fn bounded(from: i64, to: i64, limit: usize) -> Self {
        Self {
            from,
            to: Some(to),
            limit,
        }
    }

    /// Whether `timestamp` falls inside the window.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp <= self.from && self.to.map_or(true, |to| timestamp >= to)
    }
}

/// Fixed document-store filters.
///
/// Column-store backends ignore them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilters {
    /// Return blocked (`true`) or visible (`false`) messages.
    #[serde(default)]
    pub blocked: bool,
    /// Restrict to one sender, compared against the canonical player id.
    #[serde(default)]
    pub player_id: Option<String>,
}

impl MessageFilters {
    /// Filters for one sender's visible messages.
    pub fn for_player(player_id: impl Into<String>) -> Self {
        Self {
            blocked: false,
            player_id: Some(player_id.into()),
        }
    }

    /// Filters for one sender's blocked messages.
    pub fn blocked_for_player(player_id: impl Into<String>) -> Self {
        Self {
            blocked: true,
            player_id: Some(player_id.into()),
        }
    }
}

/// Result of a topic authorization check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// At least one requested topic is readable.
    pub authorized_any: bool,
    /// Readable concrete topics, in request order, each at most once.
    pub topics: Vec<String>,
}

impl Authorization {
    /// Authorization over exactly `topics`.
    pub fn granted(topics: Vec<String>) -> Self {
        Self {
            authorized_any: !topics.is_empty(),
            topics,
        }
    }

    /// Nothing readable.
    pub fn denied() -> Self {
        Self::default()
    }
}

/// Malformed input that was corrected instead of rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryAnomaly {
    /// `since` pointed into the future; the request fell back to the latest
    /// messages with a substituted limit.
    FutureSince {
        /// Caller identity.
        identity: String,
        /// Requested topic.
        topic: String,
        /// Original `since` value.
        since: i64,
        /// Server time when the anomaly was seen.
        now: i64,
        /// Limit used instead of the requested one.
        substituted_limit: usize,
    },
}

impl QueryAnomaly {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FutureSince { .. } => "future_since",
        }
    }
}
