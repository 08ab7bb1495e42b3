//! # Topic Authorizer
//!
//! Decides which requested topics an identity may read. One ACL lookup per
//! request, covering every topic and its single-level wildcard form.

use std::sync::Arc;

use tracing::debug;

use crate::algorithms::{candidate_patterns, dedup_in_order, select_authorized};
use crate::domain::{topic, Authorization, HistoryError, RequestContext};
use crate::ports::AuthorizationSource;

/// Topic authorizer.
pub struct TopicAuthorizer {
    source: Arc<dyn AuthorizationSource>,
    allow_anonymous: bool,
}

impl TopicAuthorizer {
    /// Authorizer backed by `source`. With `allow_anonymous` the source is
    /// never consulted.
    pub fn new(source: Arc<dyn AuthorizationSource>, allow_anonymous: bool) -> Self {
        Self {
            source,
            allow_anonymous,
        }
    }

    /// Readable subset of `topics` for `identity`.
    ///
    /// Fails on empty or wildcard topics and on any ACL source error.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        identity: &str,
        topics: &[String],
    ) -> Result<Authorization, HistoryError> {
        if topics.is_empty() {
            return Err(HistoryError::NoTopics);
        }
        for requested in topics {
            topic::validate_concrete(requested)?;
        }

        if self.allow_anonymous {
            return Ok(Authorization::granted(dedup_in_order(topics)));
        }

        let candidates = candidate_patterns(topics);
        let granted = tokio::select! {
            biased;
            done = ctx.done() => return Err(done.into()),
            granted = self.source.granted_patterns(ctx, identity, &candidates) => granted?,
        };

        let authorization = select_authorized(topics, &granted);
        debug!(
            request_id = %ctx.request_id(),
            identity,
            requested = topics.len(),
            authorized = authorization.topics.len(),
            "[topic-history] Authorization resolved"
        );
        Ok(authorization)
    }
}
