//! In-Memory Drivers
//!
//! Process-local implementations of the store and ACL ports. Used by tests
//! and for running the service without external backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{
    AuthSourceError, Bucket, BucketClock, Message, MessageFilters, MessageRecord,
    RequestContext, StoreError, TopicWindow,
};
use crate::ports::outbound::{AuthorizationSource, BucketStore, TimeSource, WindowStore};

/// TTL applied when an insert asks for none.
pub const DEFAULT_INSERT_TTL: Duration = Duration::from_secs(60);

fn expiry(now: i64, ttl: Duration) -> i64 {
    let ttl = if ttl.is_zero() { DEFAULT_INSERT_TTL } else { ttl };
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

#[derive(Clone, Debug)]
struct BucketRow {
    message: Message,
    seq: u64,
    expires_at: Option<i64>,
}

/// Column-store stand-in keyed by `(topic, bucket)`.
///
/// Rows within a partition are ordered newest first; rows sharing a
/// timestamp keep reverse insertion order.
pub struct InMemoryBucketStore {
    partitions: RwLock<HashMap<(String, Bucket), Vec<BucketRow>>>,
    seq: AtomicU64,
    clock: BucketClock,
    time: Arc<dyn TimeSource>,
}

impl InMemoryBucketStore {
    /// Empty store using the default bucket clock.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
            clock: BucketClock::default(),
            time,
        }
    }

    /// Insert a non-expiring message at `timestamp`, bucketed by the clock.
    pub fn insert_at(&self, topic: &str, payload: &str, timestamp: i64) {
        let bucket = self.clock.get(timestamp);
        self.push(topic, bucket, Message::new(topic, payload, timestamp), None);
    }

    /// Rows currently stored in one partition, expired ones included.
    pub fn partition_len(&self, topic: &str, bucket: Bucket) -> usize {
        self.partitions
            .read()
            .get(&(topic.to_string(), bucket))
            .map_or(0, Vec::len)
    }

    fn push(&self, topic: &str, bucket: Bucket, message: Message, expires_at: Option<i64>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.partitions
            .write()
            .entry((topic.to_string(), bucket))
            .or_default()
            .push(BucketRow {
                message,
                seq,
                expires_at,
            });
    }
}

#[async_trait]
impl BucketStore for InMemoryBucketStore {
    async fn select_messages_in_bucket(
        &self,
        ctx: &RequestContext,
        topic: &str,
        bucket: Bucket,
        window: &TopicWindow,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        if ctx.is_done() {
            return Err(StoreError::Cancelled);
        }
        let now = self.time.now();
        let partitions = self.partitions.read();
        let Some(rows) = partitions.get(&(topic.to_string(), bucket)) else {
            return Ok(Vec::new());
        };
        let mut live: Vec<&BucketRow> = rows
            .iter()
            .filter(|row| row.expires_at.map_or(true, |at| at > now))
            .filter(|row| window.contains(row.message.unix_timestamp()))
            .collect();
        live.sort_by(|a, b| {
            b.message
                .timestamp
                .cmp(&a.message.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(live
            .into_iter()
            .take(limit)
            .map(|row| row.message.clone())
            .collect())
    }

    async fn insert_with_ttl(
        &self,
        _ctx: &RequestContext,
        topic: &str,
        payload: &str,
        bucket: Bucket,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = self.time.now();
        self.push(
            topic,
            bucket,
            Message::new(topic, payload, now),
            Some(expiry(now, ttl)),
        );
        debug!(topic, bucket, "[topic-history] Inserted message with TTL");
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct WindowRow {
    record: MessageRecord,
    seq: u64,
    expires_at: Option<i64>,
}

/// Document-store stand-in.
pub struct InMemoryWindowStore {
    rows: RwLock<Vec<WindowRow>>,
    seq: AtomicU64,
    time: Arc<dyn TimeSource>,
}

impl InMemoryWindowStore {
    /// Empty store.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            seq: AtomicU64::new(0),
            time,
        }
    }

    /// Insert a non-expiring record.
    pub fn insert(&self, record: MessageRecord) {
        self.push(record, None);
    }

    fn push(&self, record: MessageRecord, expires_at: Option<i64>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.rows.write().push(WindowRow {
            record,
            seq,
            expires_at,
        });
    }
}

#[async_trait]
impl WindowStore for InMemoryWindowStore {
    async fn select_messages_by_window(
        &self,
        ctx: &RequestContext,
        topic: &str,
        from: i64,
        to: Option<i64>,
        limit: usize,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError> {
        if ctx.is_done() {
            return Err(StoreError::Cancelled);
        }
        let now = self.time.now();
        let rows = self.rows.read();
        let mut matching: Vec<&WindowRow> = rows
            .iter()
            .filter(|row| row.expires_at.map_or(true, |at| at > now))
            .filter(|row| row.record.topic == topic)
            .filter(|row| row.record.timestamp <= from && to.map_or(true, |to| row.record.timestamp >= to))
            .filter(|row| row.record.matches(filters))
            .collect();
        matching.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|row| row.record.clone().into_message())
            .collect())
    }

    async fn insert_with_ttl(
        &self,
        _ctx: &RequestContext,
        record: MessageRecord,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = expiry(self.time.now(), ttl);
        self.push(record, Some(expires_at));
        Ok(())
    }
}

/// ACL stand-in: identity → granted patterns.
#[derive(Default)]
pub struct InMemoryAclSource {
    grants: RwLock<HashMap<String, Vec<String>>>,
    lookups: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryAclSource {
    /// Empty ACL: nothing granted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `pattern` to `identity`.
    pub fn grant(&self, identity: &str, pattern: &str) {
        self.grants
            .write()
            .entry(identity.to_string())
            .or_default()
            .push(pattern.to_string());
    }

    /// Make every lookup fail with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Lookups performed so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationSource for InMemoryAclSource {
    async fn granted_patterns(
        &self,
        ctx: &RequestContext,
        identity: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, AuthSourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if ctx.is_done() {
            return Err(AuthSourceError::Cancelled);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthSourceError::Unavailable("in-memory ACL set to fail".into()));
        }
        let grants = self.grants.read();
        let Some(granted) = grants.get(identity) else {
            return Ok(Vec::new());
        };
        Ok(candidates
            .iter()
            .filter(|candidate| granted.contains(candidate))
            .cloned()
            .collect())
    }
}
