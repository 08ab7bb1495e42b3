//! # Domain Entities
//!
//! Messages as returned to callers, and the richer document-store row they
//! may be built from.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_objects::MessageFilters;

/// Message body. Column and search stores keep text, the document store
/// keeps the original JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Opaque string payload.
    Text(String),
    /// Structured JSON document.
    Document(serde_json::Value),
}

impl Payload {
    /// Payload as text; documents render as compact JSON.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Document(value) => value.to_string(),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A historical message. Immutable once read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// When the message was published.
    pub timestamp: DateTime<Utc>,
    /// Message body.
    pub payload: Payload,
    /// Concrete topic the message was published on.
    pub topic: String,
}

impl Message {
    /// Build a message from a Unix timestamp in seconds.
    ///
    /// Out-of-range timestamps collapse to the Unix epoch.
    pub fn new(topic: impl Into<String>, payload: impl Into<Payload>, timestamp_secs: i64) -> Self {
        Self {
            timestamp: unix_to_datetime(timestamp_secs),
            payload: payload.into(),
            topic: topic.into(),
        }
    }

    /// Unix timestamp in seconds.
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.timestamp()
    }

    /// Payload rendered as a string, the retro-compatible wire form.
    pub fn payload_text(&self) -> String {
        self.payload.as_text()
    }
}

pub(crate) fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Player identifier as stored by the document store.
///
/// Producers wrote it as an integer, a float or a string. It is decoded once
/// at the adapter boundary and compared through [`PlayerId::canonical`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerId {
    /// Integer id.
    Int(i64),
    /// Floating point id.
    Float(f64),
    /// String id.
    Text(String),
}

impl PlayerId {
    /// Canonical string form: the shortest decimal rendering of the value.
    ///
    /// `42`, `42.0` and `"42"` all become `"42"`; `1.5` stays `"1.5"`.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Document-store row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Producer-assigned message id.
    #[serde(default)]
    pub id: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// Original JSON payload.
    #[serde(default)]
    pub original_payload: serde_json::Value,
    /// Concrete topic.
    pub topic: String,
    /// Sender.
    #[serde(default)]
    pub player_id: PlayerId,
    /// Plain-text message body.
    #[serde(default)]
    pub message: String,
    /// Game the message belongs to.
    #[serde(default)]
    pub game_id: String,
    /// Hidden by moderation.
    #[serde(default)]
    pub blocked: bool,
    /// Pending moderation review.
    #[serde(default)]
    pub should_moderate: bool,
    /// Free-form producer metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl MessageRecord {
    /// Whether the row passes the document filters.
    pub fn matches(&self, filters: &MessageFilters) -> bool {
        if self.blocked != filters.blocked {
            return false;
        }
        match &filters.player_id {
            Some(player_id) => self.player_id.canonical() == *player_id,
            None => true,
        }
    }

    /// Convert into the caller-facing message.
    pub fn into_message(self) -> Message {
        Message {
            timestamp: unix_to_datetime(self.timestamp),
            payload: Payload::Document(self.original_payload),
            topic: self.topic,
        }
    }
}
