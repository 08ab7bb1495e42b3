//! Windowed Message Store Adapter
//!
//! Implements `MessageStore` over a document store or search index queried
//! by timestamp window.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Message, MessageFilters, RequestContext, StoreError, TopicWindow};
use crate::ports::outbound::{MessageStore, WindowStore};

/// Document-store backed message store.
pub struct WindowedMessageStore<S: WindowStore> {
    driver: Arc<S>,
}

impl<S: WindowStore> WindowedMessageStore<S> {
    /// Store over `driver`.
    pub fn new(driver: Arc<S>) -> Self {
        Self { driver }
    }

    /// Underlying driver.
    pub fn driver(&self) -> &Arc<S> {
        &self.driver
    }
}

#[async_trait]
impl<S: WindowStore + 'static> MessageStore for WindowedMessageStore<S> {
    async fn fetch_topic(
        &self,
        ctx: &RequestContext,
        topic: &str,
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError> {
        if window.to.is_some_and(|to| to > window.from) {
            return Ok(Vec::new());
        }
        self.driver
            .select_messages_by_window(ctx, topic, window.from, window.to, window.limit, filters)
            .await
    }

    fn backend_name(&self) -> &'static str {
        "windowed"
    }
}
