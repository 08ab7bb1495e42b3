//! # Domain Invariants
//!
//! Defaults and the rules every response must satisfy.

use std::collections::HashSet;

use super::entities::Message;
use super::topic;

/// Limit used when the request carries none.
pub const DEFAULT_LIMIT: usize = 10;

/// Limit used by the history-since path when the request carries none.
pub const DEFAULT_SINCE_LIMIT: usize = 10;

/// Limit substituted when `since` points into the future.
pub const FUTURE_SINCE_FALLBACK_LIMIT: usize = 100;

/// Buckets walked by the column-store backend when no lower bound is given.
pub const DEFAULT_BUCKET_QUANTITY: usize = 30;

/// Invariant: no topic contributes more than `limit` messages.
pub fn invariant_per_topic_limit(messages: &[Message], limit: usize) -> bool {
    let mut counts = std::collections::HashMap::<&str, usize>::new();
    for message in messages {
        let count = counts.entry(message.topic.as_str()).or_default();
        *count += 1;
        if *count > limit {
            return false;
        }
    }
    true
}

/// Invariant: messages are grouped by topic in request order.
///
/// Once the merged output moves past a topic it never returns to it, and
/// topics appear in the order they were requested.
pub fn invariant_request_order(messages: &[Message], requested: &[String]) -> bool {
    let mut seen = HashSet::new();
    let mut position = 0usize;
    let mut current: Option<&str> = None;
    for message in messages {
        let topic = message.topic.as_str();
        if current == Some(topic) {
            continue;
        }
        if !seen.insert(topic) {
            return false;
        }
        match requested[position..].iter().position(|t| t == topic) {
            Some(offset) => position += offset + 1,
            None => return false,
        }
        current = Some(topic);
    }
    true
}

/// Invariant: every returned topic was authorized and concrete.
pub fn invariant_authorized_only(messages: &[Message], authorized: &[String]) -> bool {
    messages
        .iter()
        .all(|m| !topic::is_wildcard(&m.topic) && authorized.iter().any(|t| *t == m.topic))
}
