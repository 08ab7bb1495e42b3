//! # Inbound Ports
//!
//! API trait for the history read paths.
//!
//! Every call authorizes before touching a store, and returns
//! [`HistoryError::Unauthorized`] when no requested topic is readable.

use async_trait::async_trait;

use crate::domain::{HistoryError, Message, MessageFilters, RequestContext};

/// Topic history API - inbound port.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// Latest messages of one topic, newest first.
    ///
    /// `from <= 0` means now, `limit == 0` means the configured default.
    async fn fetch_single_topic(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic: &str,
        from: i64,
        limit: usize,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError>;

    /// Latest messages of `prefix/suffix` for each suffix.
    ///
    /// Up to `limit` messages per topic, grouped by topic in suffix order.
    async fn fetch_multi_topic(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic_prefix: &str,
        topic_suffixes: &[String],
        from: i64,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError>;

    /// Messages of one topic published at or after `since`.
    ///
    /// A `since` in the future is reported and replaced by the latest
    /// messages with the fallback limit.
    async fn fetch_since(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic: &str,
        from: i64,
        since: i64,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError>;

    /// Messages of one topic with `to <= timestamp <= from`.
    #[allow(clippy::too_many_arguments)]
    async fn fetch_window(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic: &str,
        from: i64,
        to: i64,
        limit: usize,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError>;
}
