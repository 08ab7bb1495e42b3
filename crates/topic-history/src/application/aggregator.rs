//! # History Aggregator
//!
//! Retrieves authorized topics from the message store and merges the
//! per-topic results.
//!
//! A single topic is fetched inline. Several topics fan out to one task
//! each; tasks share only the result map and write their own key once.
//! The merged output follows request order regardless of which task
//! finished first. The first failure cancels the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::algorithms::{dedup_in_order, merge_in_request_order, truncate_to_limit};
use crate::domain::{
    HistoryError, Message, MessageFilters, RequestContext, StoreError, TopicWindow,
};
use crate::metrics;
use crate::ports::MessageStore;

type ResultMap = Arc<Mutex<HashMap<String, Vec<Message>>>>;

/// Fan-out/merge over a [`MessageStore`].
pub struct HistoryAggregator {
    store: Arc<dyn MessageStore>,
}

impl HistoryAggregator {
    /// Aggregator over `store`.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Messages for `topics`, at most `window.limit` per topic, grouped by
    /// topic in request order and newest first within a topic.
    pub async fn fetch(
        &self,
        ctx: &RequestContext,
        topics: &[String],
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError> {
        let topics = dedup_in_order(topics);
        metrics::record_fan_out_width(topics.len());
        match topics.as_slice() {
            [] => Ok(Vec::new()),
            [topic] => self.fetch_one(ctx, topic, window, filters).await,
            _ => self.fan_out(ctx, &topics, window, filters).await,
        }
    }

    async fn fetch_one(
        &self,
        ctx: &RequestContext,
        topic: &str,
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError> {
        let outcome = tokio::select! {
            biased;
            done = ctx.done() => return Err(done.into()),
            outcome = self.store.fetch_topic(ctx, topic, window, filters) => outcome,
        };
        settle(self.store.backend_name(), ctx, topic, outcome, window.limit)
    }

    async fn fan_out(
        &self,
        ctx: &RequestContext,
        topics: &[String],
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError> {
        let batch = ctx.child();
        let results: ResultMap = Arc::new(Mutex::new(HashMap::with_capacity(topics.len())));
        let mut tasks = JoinSet::new();

        debug!(
            request_id = %ctx.request_id(),
            topics = topics.len(),
            limit = window.limit,
            "[topic-history] Fanning out"
        );

        for topic in topics {
            let store = Arc::clone(&self.store);
            let task_ctx = batch.clone();
            let results = Arc::clone(&results);
            let topic = topic.clone();
            let filters = filters.clone();
            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    done = task_ctx.done() => return Err(HistoryError::from(done)),
                    outcome = store.fetch_topic(&task_ctx, &topic, window, &filters) => outcome,
                };
                let messages =
                    settle(store.backend_name(), &task_ctx, &topic, outcome, window.limit)?;
                results.lock().insert(topic, messages);
                Ok(())
            });
        }

        let outcome = loop {
            tokio::select! {
                biased;
                done = ctx.done() => break Err(HistoryError::from(done)),
                joined = tasks.join_next() => match joined {
                    None => break Ok(()),
                    Some(Ok(Ok(()))) => continue,
                    Some(Ok(Err(e))) => break Err(e),
                    Some(Err(e)) => break Err(HistoryError::TaskFailed(e.to_string())),
                },
            }
        };

        if let Err(e) = outcome {
            batch.cancel();
            tasks.abort_all();
            warn!(
                request_id = %ctx.request_id(),
                error = %e,
                "[topic-history] Fan-out aborted"
            );
            return Err(e);
        }

        let results = std::mem::take(&mut *results.lock());
        Ok(merge_in_request_order(topics, results))
    }
}

/// Apply the per-topic result policy: truncate, `NotFound` is empty, a
/// cancelled call reports why its context finished.
fn settle(
    backend: &'static str,
    ctx: &RequestContext,
    topic: &str,
    outcome: Result<Vec<Message>, StoreError>,
    limit: usize,
) -> Result<Vec<Message>, HistoryError> {
    match outcome {
        Ok(messages) => Ok(truncate_to_limit(messages, limit)),
        Err(StoreError::NotFound) => Ok(Vec::new()),
        Err(StoreError::Cancelled) if ctx.is_done() => Err(ctx
            .done_reason()
            .map_or(HistoryError::Cancelled, HistoryError::from)),
        Err(e) => {
            metrics::record_store_error(backend);
            Err(HistoryError::store(topic, e))
        }
    }
}
