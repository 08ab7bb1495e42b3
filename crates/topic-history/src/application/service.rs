//! # History Service
//!
//! Application service behind [`HistoryApi`]: normalizes the request,
//! authorizes it, then hands the readable topics to the aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::algorithms::{multi_topic_names, resolve_from, resolve_limit, resolve_since};
use crate::config::HistoryConfig;
use crate::domain::{
    HistoryError, Message, MessageFilters, QueryAnomaly, RequestContext, TopicWindow,
};
use crate::metrics;
use crate::ports::{
    AnomalyReporter, AuthorizationSource, HistoryApi, MessageStore, SystemTimeSource, TimeSource,
    TracingAnomalyReporter,
};

use super::aggregator::HistoryAggregator;
use super::authorizer::TopicAuthorizer;

/// Topic history service.
pub struct HistoryService {
    /// Configuration.
    config: HistoryConfig,
    /// ACL check.
    authorizer: TopicAuthorizer,
    /// Store fan-out.
    aggregator: HistoryAggregator,
    /// Clock for `from`/`since` defaults.
    time: Arc<dyn TimeSource>,
    /// Sink for corrected input.
    reporter: Arc<dyn AnomalyReporter>,
}

impl HistoryService {
    /// Create a service over `store` and `acl`, using the wall clock and
    /// reporting anomalies through tracing.
    pub fn new(
        config: HistoryConfig,
        store: Arc<dyn MessageStore>,
        acl: Arc<dyn AuthorizationSource>,
    ) -> Self {
        Self {
            authorizer: TopicAuthorizer::new(acl, config.allow_anonymous),
            aggregator: HistoryAggregator::new(store),
            time: Arc::new(SystemTimeSource),
            reporter: Arc::new(TracingAnomalyReporter),
            config,
        }
    }

    /// Replace the clock.
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Replace the anomaly sink.
    pub fn with_reporter(mut self, reporter: Arc<dyn AnomalyReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Authorize `topics`, then fetch the readable ones.
    async fn authorized_fetch(
        &self,
        ctx: &RequestContext,
        route: &'static str,
        identity: &str,
        topics: &[String],
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError> {
        metrics::record_request(route);
        debug!(
            request_id = %ctx.request_id(),
            route,
            identity,
            topics = ?topics,
            from = window.from,
            to = ?window.to,
            limit = window.limit,
            "[topic-history] Request"
        );

        let authorization = self.authorizer.authorize(ctx, identity, topics).await?;
        if !authorization.authorized_any {
            metrics::record_unauthorized();
            warn!(
                request_id = %ctx.request_id(),
                identity,
                topics = ?topics,
                "[topic-history] Unauthorized"
            );
            return Err(HistoryError::Unauthorized {
                identity: identity.to_string(),
            });
        }

        let messages = self
            .aggregator
            .fetch(ctx, &authorization.topics, window, filters)
            .await?;
        debug!(
            request_id = %ctx.request_id(),
            route,
            returned = messages.len(),
            "[topic-history] Response"
        );
        Ok(messages)
    }

    fn report(&self, anomaly: QueryAnomaly) {
        metrics::record_anomaly(anomaly.label());
        self.reporter.report(&anomaly);
    }
}

#[async_trait]
impl HistoryApi for HistoryService {
    async fn fetch_single_topic(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic: &str,
        from: i64,
        limit: usize,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, HistoryError> {
        let window = TopicWindow::latest(
            resolve_from(from, self.time.now()),
            resolve_limit(limit, self.config.default_limit),
        );
        self.authorized_fetch(ctx, "single_topic", identity, &[topic.to_string()], window, filters)
            .await
    }

    async fn fetch_multi_topic(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic_prefix: &str,
        topic_suffixes: &[String],
        from: i64,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        let topics = multi_topic_names(topic_prefix, topic_suffixes);
        if topics.is_empty() {
            return Err(HistoryError::NoTopics);
        }
        let window = TopicWindow::latest(
            resolve_from(from, self.time.now()),
            resolve_limit(limit, self.config.default_limit),
        );
        self.authorized_fetch(
            ctx,
            "multi_topic",
            identity,
            &topics,
            window,
            &MessageFilters::default(),
        )
        .await
    }

    async fn fetch_since(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topic: &str,
        from: i64,
        since: i64,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        let now = self.time.now();
        let resolution = resolve_since(
            since,
            limit,
            now,
            self.config.future_since_limit,
            self.config.since_default_limit,
        );
        if resolution.future_since {
            info!(
                request_id = %ctx.request_id(),
                identity,
                topic,
                since,
                now,
                "[topic-history] Future since replaced by latest messages"
            );
            self.report(QueryAnomaly::FutureSince {
                identity: identity.to_string(),
                topic: topic.to_string(),
                since,
                now,
                substituted_limit: self.config.future_since_limit,
            });
        }

        let window = TopicWindow {
            from: resolve_from(from, now),
            to: resolution.to,
            limit: resolution.limit,
        };
        self.authorized_fetch(
            ctx,
            "since",
            identity,
            &[topic.to_string()],
            window,
            &MessageFilters::default(),
        )
        .await
    }

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
    ) -> Result<Vec<Message>, HistoryError> {
        let window = TopicWindow {
            from: resolve_from(from, self.time.now()),
            to: (to > 0).then_some(to),
            limit: resolve_limit(limit, self.config.default_limit),
        };
        self.authorized_fetch(ctx, "window", identity, &[topic.to_string()], window, filters)
            .await
    }
}
