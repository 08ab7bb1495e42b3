//! # Result Merge
//!
//! Deterministic assembly of per-topic results. Completion order of the
//! fan-out never reaches the output.

use std::collections::{HashMap, HashSet};

use crate::domain::Message;

/// Remove repeated entries, keeping the first occurrence.
pub fn dedup_in_order(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// Cap one topic's messages at `limit`, keeping the store's order.
pub fn truncate_to_limit(mut messages: Vec<Message>, limit: usize) -> Vec<Message> {
    messages.truncate(limit);
    messages
}

/// Concatenate per-topic results following `order`.
///
/// Topics missing from `results` contribute nothing.
pub fn merge_in_request_order(
    order: &[String],
    mut results: HashMap<String, Vec<Message>>,
) -> Vec<Message> {
    let total = results.values().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for topic in order {
        if let Some(messages) = results.remove(topic) {
            merged.extend(messages);
        }
    }
    merged
}
