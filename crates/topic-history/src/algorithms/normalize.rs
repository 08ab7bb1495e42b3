//! # Query Normalization
//!
//! Fallback values for missing or malformed request parameters. None of
//! these reject a request.

use crate::domain::topic;

/// Zero means "not supplied".
pub fn resolve_limit(requested: usize, default_limit: usize) -> usize {
    if requested == 0 {
        default_limit
    } else {
        requested
    }
}

/// Non-positive means "now".
pub fn resolve_from(requested: i64, now: i64) -> i64 {
    if requested <= 0 {
        now
    } else {
        requested
    }
}

/// Outcome of normalizing a history-since request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinceResolution {
    /// Oldest bound, `None` when there is none.
    pub to: Option<i64>,
    /// Effective per-topic limit.
    pub limit: usize,
    /// `since` pointed past `now` and was discarded.
    pub future_since: bool,
}

/// Normalize `since` and `limit` for the history-since path.
///
/// A future `since` is dropped and the limit forced to `future_limit`.
/// A zero limit afterwards falls back to `since_default_limit`.
/// `since == 0` means no lower bound.
pub fn resolve_since(
    since: i64,
    limit: usize,
    now: i64,
    future_limit: usize,
    since_default_limit: usize,
) -> SinceResolution {
    let (since, limit, future_since) = if since > now {
        (0, future_limit, true)
    } else {
        (since, limit, false)
    };
    SinceResolution {
        to: (since != 0).then_some(since),
        limit: resolve_limit(limit, since_default_limit),
        future_since,
    }
}

/// Topic names for a multi-topic request, blank suffixes skipped.
pub fn multi_topic_names(prefix: &str, suffixes: &[String]) -> Vec<String> {
    suffixes
        .iter()
        .map(|suffix| suffix.trim())
        .filter(|suffix| !suffix.is_empty())
        .map(|suffix| topic::join(prefix, suffix))
        .collect()
}
