//! # Topics
//!
//! Slash-delimited topic names and MQTT single-level wildcard patterns.
//!
//! Requested topics are always concrete. Only authorization grants carry
//! the `+` wildcard.

use super::errors::HistoryError;

/// Segment separator.
pub const TOPIC_SEPARATOR: char = '/';

/// Single-level wildcard segment.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";

/// Multi-level wildcard segment. Never valid in a requested topic.
pub const MULTI_LEVEL_WILDCARD: &str = "#";

/// Whether `topic` contains any wildcard segment.
pub fn is_wildcard(topic: &str) -> bool {
    topic
        .split(TOPIC_SEPARATOR)
        .any(|segment| segment == SINGLE_LEVEL_WILDCARD || segment == MULTI_LEVEL_WILDCARD)
}

/// Reject empty topics and topics carrying wildcard characters.
pub fn validate_concrete(topic: &str) -> Result<(), HistoryError> {
    if topic.is_empty() || topic.contains('+') || topic.contains('#') {
        return Err(HistoryError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

/// Replace the last segment with `+`.
///
/// `chat/room/42` becomes `chat/room/+`; a single segment topic becomes `+`.
pub fn wildcard_form(topic: &str) -> String {
    match topic.rfind(TOPIC_SEPARATOR) {
        Some(idx) => format!("{}{}", &topic[..=idx], SINGLE_LEVEL_WILDCARD),
        None => SINGLE_LEVEL_WILDCARD.to_string(),
    }
}

/// MQTT single-level match: `+` stands for exactly one segment.
pub fn matches_pattern(pattern: &str, topic: &str) -> bool {
    let mut pattern_segments = pattern.split(TOPIC_SEPARATOR);
    let mut topic_segments = topic.split(TOPIC_SEPARATOR);
    loop {
        match (pattern_segments.next(), topic_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(t)) if p == SINGLE_LEVEL_WILDCARD || p == t => continue,
            _ => return false,
        }
    }
}

/// Build `prefix/suffix`.
pub fn join(prefix: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, TOPIC_SEPARATOR, suffix)
}
