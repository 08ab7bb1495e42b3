//! # Outbound Ports
//!
//! Traits for the collaborators the engine reads from: message stores,
//! the ACL source, the clock and the anomaly sink.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    AuthSourceError, Bucket, Message, MessageFilters, MessageRecord, QueryAnomaly,
    RequestContext, StoreError, TopicWindow,
};

/// Aggregator-facing message store.
///
/// Returns at most `window.limit` messages for one topic, newest first.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch the messages of `topic` inside `window`.
    async fn fetch_topic(
        &self,
        ctx: &RequestContext,
        topic: &str,
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError>;

    /// Backend label for logs and metrics.
    fn backend_name(&self) -> &'static str;
}

/// Column-store driver partitioned by `(topic, bucket)`.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Up to `limit` messages of one partition inside the time bounds of
    /// `window`, newest first. `window.limit` is not consulted.
    async fn select_messages_in_bucket(
        &self,
        ctx: &RequestContext,
        topic: &str,
        bucket: Bucket,
        window: &TopicWindow,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    /// Walk `buckets` in order, asking each for the remaining limit.
    ///
    /// Stops as soon as `window.limit` messages are collected. Rows outside
    /// the window never count against the limit. An empty partition
    /// (`NotFound`) is skipped.
    async fn select_messages_in_buckets(
        &self,
        ctx: &RequestContext,
        topic: &str,
        buckets: &[Bucket],
        window: &TopicWindow,
    ) -> Result<Vec<Message>, StoreError> {
        let limit = window.limit;
        let mut collected = Vec::new();
        for &bucket in buckets {
            if collected.len() >= limit {
                break;
            }
            if ctx.is_done() {
                return Err(StoreError::Cancelled);
            }
            let remaining = limit - collected.len();
            match self
                .select_messages_in_bucket(ctx, topic, bucket, window, remaining)
                .await
            {
                Ok(messages) => collected.extend(
                    messages
                        .into_iter()
                        .filter(|m| window.contains(m.unix_timestamp()))
                        .take(remaining),
                ),
                Err(StoreError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(collected)
    }

    /// Insert one message into `bucket`, expiring after `ttl`. Test fixtures only.
    async fn insert_with_ttl(
        &self,
        ctx: &RequestContext,
        topic: &str,
        payload: &str,
        bucket: Bucket,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}

/// Document-store or search-index driver queried by time window.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Messages with `to <= timestamp <= from`, newest first, at most `limit`.
    async fn select_messages_by_window(
        &self,
        ctx: &RequestContext,
        topic: &str,
        from: i64,
        to: Option<i64>,
        limit: usize,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError>;

    /// Insert one record, expiring after `ttl`. Test fixtures only.
    async fn insert_with_ttl(
        &self,
        ctx: &RequestContext,
        record: MessageRecord,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}

/// ACL lookup.
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    /// Which of `candidates` are granted to `identity`.
    async fn granted_patterns(
        &self,
        ctx: &RequestContext,
        identity: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, AuthSourceError>;
}

/// Time source.
pub trait TimeSource: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Sink for corrected-but-suspicious input.
pub trait AnomalyReporter: Send + Sync {
    /// Record one anomaly. Must not block.
    fn report(&self, anomaly: &QueryAnomaly);
}

/// Reports anomalies as `warn!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnomalyReporter;

impl AnomalyReporter for TracingAnomalyReporter {
    fn report(&self, anomaly: &QueryAnomaly) {
        match anomaly {
            QueryAnomaly::FutureSince {
                identity,
                topic,
                since,
                now,
                substituted_limit,
            } => tracing::warn!(
                kind = anomaly.label(),
                identity = %identity,
                topic = %topic,
                since,
                now,
                substituted_limit,
                "[topic-history] since is in the future, serving latest messages"
            ),
        }
    }
}
