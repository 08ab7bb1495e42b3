//! Test doubles shared by unit tests and the workspace integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    Message, MessageFilters, QueryAnomaly, RequestContext, StoreError, TopicWindow,
};
use crate::ports::{AnomalyReporter, MessageStore, TimeSource};

pub fn message(topic: &str, timestamp: i64) -> Message {
    Message::new(topic, format!("{}@{}", topic, timestamp), timestamp)
}

/// `count` messages on `topic`, newest first, one second apart ending at `newest`.
pub fn messages(topic: &str, newest: i64, count: usize) -> Vec<Message> {
    (0..count as i64).map(|i| message(topic, newest - i)).collect()
}

#[derive(Clone, Default)]
struct Script {
    messages: Vec<Message>,
    delay: Duration,
    failure: Option<StoreError>,
}

/// Message store answering from per-topic scripts.
///
/// Scripted messages come back as-is, ignoring the window and the limit,
/// so callers can check that they enforce both themselves. Unscripted
/// topics answer `NotFound`.
#[derive(Default)]
pub struct ScriptedMessageStore {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, TopicWindow, MessageFilters)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(self, topic: &str, messages: Vec<Message>) -> Self {
        self.scripts.lock().entry(topic.to_string()).or_default().messages = messages;
        self
    }

    pub fn with_delay(self, topic: &str, delay: Duration) -> Self {
        self.scripts.lock().entry(topic.to_string()).or_default().delay = delay;
        self
    }

    pub fn with_failure(self, topic: &str, failure: StoreError) -> Self {
        self.scripts.lock().entry(topic.to_string()).or_default().failure = Some(failure);
        self
    }

    /// Calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<(String, TopicWindow, MessageFilters)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of concurrent `fetch_topic` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end of their script.
    pub fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageStore for ScriptedMessageStore {
    async fn fetch_topic(
        &self,
        ctx: &RequestContext,
        topic: &str,
        window: TopicWindow,
        filters: &MessageFilters,
    ) -> Result<Vec<Message>, StoreError> {
        self.calls
            .lock()
            .push((topic.to_string(), window, filters.clone()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let script = self.scripts.lock().get(topic).cloned();
        let Some(script) = script else {
            self.completed.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::NotFound);
        };

        if !script.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(script.delay) => {}
                _ = ctx.done() => return Err(StoreError::Cancelled),
            }
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        match script.failure {
            Some(failure) => Err(failure),
            None => Ok(script.messages),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Keeps every reported anomaly.
#[derive(Default)]
pub struct RecordingAnomalyReporter {
    reported: Mutex<Vec<QueryAnomaly>>,
}

impl RecordingAnomalyReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> Vec<QueryAnomaly> {
        self.reported.lock().clone()
    }
}

impl AnomalyReporter for RecordingAnomalyReporter {
    fn report(&self, anomaly: &QueryAnomaly) {
        self.reported.lock().push(anomaly.clone());
    }
}

/// Settable clock.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: AtomicI64,
}

impl FixedTimeSource {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
