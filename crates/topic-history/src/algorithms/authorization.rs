//! # Topic Authorization Matching
//!
//! Pure half of the authorizer: which patterns to ask the ACL source about,
//! and which requested topics the returned grants cover.

use std::collections::HashSet;

use crate::domain::topic::{is_wildcard, matches_pattern, wildcard_form};
use crate::domain::Authorization;

use super::merge::dedup_in_order;

/// Candidate patterns for one ACL lookup.
///
/// Every requested topic followed by its single-level wildcard form,
/// deduplicated with first occurrence kept.
pub fn candidate_patterns(topics: &[String]) -> Vec<String> {
    let expanded: Vec<String> = topics
        .iter()
        .flat_map(|topic| [topic.clone(), wildcard_form(topic)])
        .collect();
    dedup_in_order(&expanded)
}

/// Requested topics covered by `granted`.
///
/// Only grants that were among the lookup's candidate patterns count; a
/// topic is covered when one of them matches it. That amounts to its exact
/// name or its wildcard form having been granted. Only concrete topics are
/// returned, in request order, each once.
pub fn select_authorized(topics: &[String], granted: &[String]) -> Authorization {
    let candidates: HashSet<String> = candidate_patterns(topics).into_iter().collect();
    let patterns: Vec<&str> = granted
        .iter()
        .filter(|pattern| candidates.contains(pattern.as_str()))
        .map(String::as_str)
        .collect();
    let covered: Vec<String> = dedup_in_order(topics)
        .into_iter()
        .filter(|topic| !is_wildcard(topic))
        .filter(|topic| patterns.iter().any(|pattern| matches_pattern(pattern, topic)))
        .collect();
    Authorization::granted(covered)
}
