//! Bucketed Message Store Adapter
//!
//! Implements `MessageStore` over a column store partitioned by
//! `(topic, bucket)`. Bucket resolution happens here and nowhere else.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{BucketClock, Message, MessageFilters, RequestContext, StoreError, TopicWindow};
use crate::ports::outbound::{BucketStore, MessageStore};

/// Column-store backed message store.
pub struct BucketedMessageStore<S: BucketStore> {
    driver: Arc<S>,
    clock: BucketClock,
    bucket_quantity: usize,
}

impl<S: BucketStore> BucketedMessageStore<S> {
    /// Store over `driver`, walking at most `bucket_quantity` buckets when
    /// the window has no lower bound.
    pub fn new(driver: Arc<S>, bucket_quantity: usize) -> Self {
        Self {
            driver,
            clock: BucketClock::default(),
            bucket_quantity,
        }
    }

    /// Replace the bucket clock.
    pub fn with_clock(mut self, clock: BucketClock) -> Self {
        self.clock = clock;
        self
    }

    /// Underlying driver.
    pub fn driver(&self) -> &Arc<S> {
        &self.driver
    }

    /// Buckets to walk for `window`, newest first.
    pub fn buckets_for(&self, window: &TopicWindow) -> Vec<u64> {
        match window.to {
            Some(to) => self.clock.range(window.from, to),
            None => self.clock.buckets(window.from, self.bucket_quantity),
        }
    }
}

#[async_trait]
impl<S: BucketStore + 'static> MessageStore for BucketedMessageStore<S> {
    async fn fetch_topic(
        &self,
        ctx: &RequestContext,
        topic: &str,
        window: TopicWindow,
        _filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError> {
        let buckets = self.buckets_for(&window);
        debug!(
            topic,
            from = window.from,
            to = ?window.to,
            limit = window.limit,
            buckets = buckets.len(),
            "[topic-history] Walking buckets"
        );
        if buckets.is_empty() || window.limit == 0 {
            return Ok(Vec::new());
        }

        self.driver
            .select_messages_in_buckets(ctx, topic, &buckets, &window)
            .await
    }

    fn backend_name(&self) -> &'static str {
        "bucketed"
    }
}
