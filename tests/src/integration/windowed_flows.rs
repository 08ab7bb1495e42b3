//! # Windowed Store Flows
//!
//! `HistoryService` → `WindowedMessageStore` → `InMemoryWindowStore`, plus
//! a recording search-index driver.
//!
//! ## Flows Tested
//!
//! 1. **Player window**: bounded window with player and blocked filters
//! 2. **Player id decoding**: integer, float and string ids from raw documents
//! 3. **Document payloads**: JSON payload rendered as text
//! 4. **Missing index**: `NotFound` from the driver is an empty history

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use topic_history::test_utils::FixedTimeSource;
    use topic_history::{
        HistoryApi, HistoryConfig, HistoryService, InMemoryAclSource, InMemoryWindowStore,
        Message, MessageFilters, MessageRecord, Payload, RequestContext, StoreError,
        WindowStore, WindowedMessageStore,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const NOW: i64 = 1_700_000_000;

    fn document(ts: i64, player_id: serde_json::Value, blocked: bool) -> MessageRecord {
        serde_json::from_value(json!({
            "id": format!("msg-{}", ts),
            "timestamp": ts,
            "original_payload": { "text": format!("hello at {}", ts) },
            "topic": "chat/support",
            "player_id": player_id,
            "message": format!("hello at {}", ts),
            "game_id": "game-1",
            "blocked": blocked,
            "should_moderate": false,
            "metadata": {}
        }))
        .unwrap()
    }

    fn service_over(driver: Arc<InMemoryWindowStore>) -> (HistoryService, Arc<InMemoryAclSource>) {
        let acl = Arc::new(InMemoryAclSource::new());
        acl.grant("support", "chat/+");
        let store = Arc::new(WindowedMessageStore::new(driver));
        let service = HistoryService::new(HistoryConfig::default(), store, acl.clone())
            .with_time_source(Arc::new(FixedTimeSource::new(NOW)));
        (service, acl)
    }

    fn seeded() -> Arc<InMemoryWindowStore> {
        let driver = Arc::new(InMemoryWindowStore::new(Arc::new(FixedTimeSource::new(NOW))));
        driver.insert(document(NOW - 10, json!(42), false));
        driver.insert(document(NOW - 20, json!(42.0), false));
        driver.insert(document(NOW - 30, json!("42"), false));
        driver.insert(document(NOW - 40, json!(7), false));
        driver.insert(document(NOW - 50, json!(42), true));
        driver.insert(document(NOW - 5_000, json!(42), false));
        driver
    }

    fn timestamps(got: &[Message]) -> Vec<i64> {
        got.iter().map(Message::unix_timestamp).collect()
    }

    // =============================================================================
    // PLAYER WINDOW
    // =============================================================================

    #[tokio::test]
    async fn test_player_window_matches_every_id_encoding() {
        let (service, _) = service_over(seeded());
        let got = service
            .fetch_window(
                &RequestContext::new(),
                "support",
                "chat/support",
                NOW,
                NOW - 1_000,
                0,
                &MessageFilters::for_player("42"),
            )
            .await
            .unwrap();

        assert_eq!(timestamps(&got), vec![NOW - 10, NOW - 20, NOW - 30]);
    }

    #[tokio::test]
    async fn test_blocked_messages_only_on_request() {
        let (service, _) = service_over(seeded());
        let got = service
            .fetch_window(
                &RequestContext::new(),
                "support",
                "chat/support",
                NOW,
                NOW - 1_000,
                0,
                &MessageFilters::blocked_for_player("42"),
            )
            .await
            .unwrap();

        assert_eq!(timestamps(&got), vec![NOW - 50]);
    }

    #[tokio::test]
    async fn test_window_without_lower_bound() {
        let (service, _) = service_over(seeded());
        let got = service
            .fetch_window(
                &RequestContext::new(),
                "support",
                "chat/support",
                NOW - 25,
                0,
                0,
                &MessageFilters::for_player("42"),
            )
            .await
            .unwrap();

        assert_eq!(timestamps(&got), vec![NOW - 30, NOW - 5_000]);
    }

    // =============================================================================
    // PAYLOADS
    // =============================================================================

    #[tokio::test]
    async fn test_document_payload_rendered_as_text() {
        let (service, _) = service_over(seeded());
        let got = service
            .fetch_single_topic(
                &RequestContext::new(),
                "support",
                "chat/support",
                0,
                1,
                &MessageFilters::default(),
            )
            .await
            .unwrap();

        assert_eq!(got.len(), 1);
        assert!(matches!(got[0].payload, Payload::Document(_)));
        let text = got[0].payload_text();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["text"], format!("hello at {}", NOW - 10));
    }

    #[tokio::test]
    async fn test_since_over_documents() {
        let (service, _) = service_over(seeded());
        let got = service
            .fetch_since(&RequestContext::new(), "support", "chat/support", 0, NOW - 35, 0)
            .await
            .unwrap();

        assert_eq!(timestamps(&got), vec![NOW - 10, NOW - 20, NOW - 30]);
    }

    // =============================================================================
    // MISSING INDEX
    // =============================================================================

    /// Search-index driver whose per-topic index may not exist yet.
    #[derive(Default)]
    struct RecordingIndex {
        windows: Mutex<Vec<(String, i64, Option<i64>, usize)>>,
    }

    #[async_trait]
    impl WindowStore for RecordingIndex {
        async fn select_messages_by_window(
            &self,
            _ctx: &RequestContext,
            topic: &str,
            from: i64,
            to: Option<i64>,
            limit: usize,
            _filters: &MessageFilters,
        ) -> Result<Vec<Message>, StoreError> {
            self.windows.lock().push((topic.to_string(), from, to, limit));
            Err(StoreError::NotFound)
        }

        async fn insert_with_ttl(
            &self,
            _ctx: &RequestContext,
            _record: MessageRecord,
            _ttl: Duration,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only index".into()))
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_empty_history() {
        let index = Arc::new(RecordingIndex::default());
        let acl = Arc::new(InMemoryAclSource::new());
        acl.grant("u1", "chat/+");
        let service = HistoryService::new(
            HistoryConfig::default(),
            Arc::new(WindowedMessageStore::new(index.clone())),
            acl,
        )
        .with_time_source(Arc::new(FixedTimeSource::new(NOW)));

        let got = service
            .fetch_multi_topic(
                &RequestContext::new(),
                "u1",
                "chat",
                &["a".to_string(), "b".to_string()],
                0,
                0,
            )
            .await
            .unwrap();

        assert!(got.is_empty());
        let mut windows = index.windows.lock().clone();
        windows.sort();
        assert_eq!(
            windows,
            vec![
                ("chat/a".to_string(), NOW, None, 10),
                ("chat/b".to_string(), NOW, None, 10),
            ]
        );
    }
}
