//! # Algorithms Module
//!
//! Pure logic behind authorization, query normalization and result merging.

pub mod authorization;
pub mod merge;
pub mod normalize;

pub use authorization::{candidate_patterns, select_authorized};
pub use merge::{dedup_in_order, merge_in_request_order, truncate_to_limit};
pub use normalize::{multi_topic_names, resolve_from, resolve_limit, resolve_since, SinceResolution};
