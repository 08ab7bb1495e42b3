//! # Request Context
//!
//! Caller-supplied cancellation and deadline, threaded through every port
//! call. The fan-out gives each per-topic task a child context so aborting
//! the batch never cancels the caller's token.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::errors::HistoryError;

/// Why a context finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextDone {
    /// The token was cancelled.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl From<ContextDone> for HistoryError {
    fn from(done: ContextDone) -> Self {
        match done {
            ContextDone::Cancelled => HistoryError::Cancelled,
            ContextDone::DeadlineExceeded => HistoryError::DeadlineExceeded,
        }
    }
}

/// Per-request cancellation scope.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: Uuid,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Fresh context: no deadline, not cancelled.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context driven by an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token,
            deadline: None,
        }
    }

    /// Same context with a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Same context with an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Correlation id for logs.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Child scope: cancelled with the parent, cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id,
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this scope and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the token is cancelled or the deadline has passed.
    pub fn is_done(&self) -> bool {
        self.done_reason().is_some()
    }

    /// Why the context is finished, if it is. Cancellation wins over the deadline.
    pub fn done_reason(&self) -> Option<ContextDone> {
        if self.token.is_cancelled() {
            Some(ContextDone::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ContextDone::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Whether the token is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextDone {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ContextDone::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextDone::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextDone::Cancelled
            }
        }
    }
}
