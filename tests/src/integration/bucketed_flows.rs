//! # Bucketed Store Flows
//!
//! `HistoryService` → `BucketedMessageStore` → `InMemoryBucketStore`.
//!
//! ## Flows Tested
//!
//! 1. **Single topic**: newest messages collected across several buckets
//! 2. **Multi topic**: request-order merge and per-topic limit
//! 3. **Concurrent requests**: many multi-topic reads in flight at once
//! 4. **Authorization**: wildcard grants, partial grants, ACL outage
//! 5. **Since**: bounded bucket range, future `since` fallback
//! 6. **Cancellation**: caller cancel and deadline through the service

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use topic_history::test_utils::{
        messages, FixedTimeSource, RecordingAnomalyReporter, ScriptedMessageStore,
    };
    use topic_history::{
        BucketClock, BucketStore, BucketedMessageStore, HistoryApi, HistoryConfig, HistoryError,
        HistoryErrorKind, HistoryService, InMemoryAclSource, InMemoryBucketStore, MessageFilters,
        QueryAnomaly, RequestContext, BUCKET_SIZE_SECS, EPOCH_START,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const NOW: i64 = EPOCH_START + 100 * BUCKET_SIZE_SECS + 500;

    struct Harness {
        service: Arc<HistoryService>,
        driver: Arc<InMemoryBucketStore>,
        acl: Arc<InMemoryAclSource>,
        reporter: Arc<RecordingAnomalyReporter>,
        time: Arc<FixedTimeSource>,
    }

    fn harness(config: HistoryConfig) -> Harness {
        let time = Arc::new(FixedTimeSource::new(NOW));
        let driver = Arc::new(InMemoryBucketStore::new(time.clone()));
        let store = Arc::new(BucketedMessageStore::new(
            driver.clone(),
            config.bucket_quantity,
        ));
        let acl = Arc::new(InMemoryAclSource::new());
        let reporter = Arc::new(RecordingAnomalyReporter::new());
        let service = HistoryService::new(config, store, acl.clone())
            .with_time_source(time.clone())
            .with_reporter(reporter.clone());
        Harness {
            service: Arc::new(service),
            driver,
            acl,
            reporter,
            time,
        }
    }

    fn suffixes(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn timestamps(got: &[topic_history::Message]) -> Vec<i64> {
        got.iter().map(|m| m.unix_timestamp()).collect()
    }

    // =============================================================================
    // SINGLE TOPIC
    // =============================================================================

    #[tokio::test]
    async fn test_single_topic_spans_buckets() {
        topic_history::test_utils::init_tracing();
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/+");
        for ts in [
            NOW - 10,
            NOW - BUCKET_SIZE_SECS,
            NOW - 2 * BUCKET_SIZE_SECS,
            NOW - 3 * BUCKET_SIZE_SECS,
        ] {
            h.driver.insert_at("chat/general", "hi", ts);
        }

        let got = h
            .service
            .fetch_single_topic(
                &RequestContext::new(),
                "u1",
                "chat/general",
                0,
                3,
                &MessageFilters::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            timestamps(&got),
            vec![NOW - 10, NOW - BUCKET_SIZE_SECS, NOW - 2 * BUCKET_SIZE_SECS]
        );
    }

    #[tokio::test]
    async fn test_single_topic_from_in_the_past() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/general");
        for ts in [NOW - 10, NOW - 20, NOW - 30] {
            h.driver.insert_at("chat/general", "hi", ts);
        }
        let got = h
            .service
            .fetch_single_topic(
                &RequestContext::new(),
                "u1",
                "chat/general",
                NOW - 15,
                0,
                &MessageFilters::default(),
            )
            .await
            .unwrap();
        assert_eq!(timestamps(&got), vec![NOW - 20, NOW - 30]);
    }

    #[tokio::test]
    async fn test_past_from_with_newer_rows_fills_limit() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/general");
        for i in 0..20 {
            h.driver.insert_at("chat/general", "new", NOW - i);
        }
        for i in 0..3 {
            h.driver.insert_at("chat/general", "old", NOW - 100 - i);
        }
        let got = h
            .service
            .fetch_single_topic(
                &RequestContext::new(),
                "u1",
                "chat/general",
                NOW - 50,
                2,
                &MessageFilters::default(),
            )
            .await
            .unwrap();
        assert_eq!(timestamps(&got), vec![NOW - 100, NOW - 101]);
    }

    // =============================================================================
    // MULTI TOPIC
    // =============================================================================

    #[tokio::test]
    async fn test_multi_topic_request_order_and_limit() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "room/+");
        for i in 0..5 {
            h.driver.insert_at("room/1", "m", NOW - 100 - i);
        }
        h.driver.insert_at("room/2", "m", NOW - 1);
        for i in 0..12 {
            h.driver.insert_at("room/3", "m", NOW - 200 - i);
        }

        let got = h
            .service
            .fetch_multi_topic(
                &RequestContext::new(),
                "u1",
                "room",
                &suffixes(&["3", "1", "2"]),
                0,
                4,
            )
            .await
            .unwrap();

        let topics: Vec<&str> = got.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "room/3", "room/3", "room/3", "room/3", "room/1", "room/1", "room/1", "room/1",
                "room/2"
            ]
        );
        assert_eq!(
            timestamps(&got[..4]),
            vec![NOW - 200, NOW - 201, NOW - 202, NOW - 203]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_multi_topic_requests() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "room/+");
        for room in ["a", "b", "c", "d"] {
            for i in 0..3 {
                h.driver.insert_at(&format!("room/{}", room), "m", NOW - i);
            }
        }

        let orders = [
            ["a", "b", "c", "d"],
            ["d", "c", "b", "a"],
            ["b", "d", "a", "c"],
            ["c", "a", "d", "b"],
        ];
        let mut handles = Vec::new();
        for round in 0..16 {
            let service = h.service.clone();
            let order = orders[round % orders.len()];
            handles.push(tokio::spawn(async move {
                let requested = suffixes(&order);
                let got = service
                    .fetch_multi_topic(&RequestContext::new(), "u1", "room", &requested, 0, 2)
                    .await;
                (order, got)
            }));
        }

        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        for (order, got) in results {
            let got = got.unwrap();
            let expected: Vec<String> = order
                .iter()
                .flat_map(|room| {
                    let topic = format!("room/{}", room);
                    [topic.clone(), topic]
                })
                .collect();
            let topics: Vec<String> = got.iter().map(|m| m.topic.clone()).collect();
            assert_eq!(topics, expected);
        }
    }

    // =============================================================================
    // AUTHORIZATION
    // =============================================================================

    #[tokio::test]
    async fn test_partial_grant_only_returns_granted_topics() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u2", "room/1");
        h.acl.grant("u2", "room/3");
        for room in ["room/1", "room/2", "room/3"] {
            h.driver.insert_at(room, "m", NOW - 5);
        }

        let got = h
            .service
            .fetch_multi_topic(
                &RequestContext::new(),
                "u2",
                "room",
                &suffixes(&["1", "2", "3"]),
                0,
                0,
            )
            .await
            .unwrap();

        let topics: Vec<&str> = got.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(topics, vec!["room/1", "room/3"]);
        assert_eq!(h.acl.lookups(), 1);
    }

    #[tokio::test]
    async fn test_unknown_identity_is_unauthorized() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "room/+");
        h.driver.insert_at("room/1", "m", NOW - 5);

        let err = h
            .service
            .fetch_multi_topic(&RequestContext::new(), "u3", "room", &suffixes(&["1"]), 0, 0)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), HistoryErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_acl_outage_is_not_unauthorized() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "room/+");
        h.acl.set_failing(true);

        let err = h
            .service
            .fetch_single_topic(
                &RequestContext::new(),
                "u1",
                "room/1",
                0,
                0,
                &MessageFilters::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), HistoryErrorKind::AuthSource);
    }

    // =============================================================================
    // SINCE
    // =============================================================================

    #[tokio::test]
    async fn test_since_bounds_the_walk() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/general");
        for ts in [NOW - 10, NOW - 100, NOW - 1_000, NOW - 5 * BUCKET_SIZE_SECS] {
            h.driver.insert_at("chat/general", "m", ts);
        }

        let got = h
            .service
            .fetch_since(&RequestContext::new(), "u1", "chat/general", 0, NOW - 500, 0)
            .await
            .unwrap();

        assert_eq!(timestamps(&got), vec![NOW - 10, NOW - 100]);
        assert!(h.reporter.reported().is_empty());
    }

    #[tokio::test]
    async fn test_future_since_returns_latest() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/general");
        for ts in [NOW - 10, NOW - 100, NOW - 1_000, NOW - 5 * BUCKET_SIZE_SECS] {
            h.driver.insert_at("chat/general", "m", ts);
        }

        let got = h
            .service
            .fetch_since(&RequestContext::new(), "u1", "chat/general", 0, NOW + 60, 1)
            .await
            .unwrap();

        assert_eq!(got.len(), 4);
        match h.reporter.reported().as_slice() {
            [QueryAnomaly::FutureSince {
                since,
                substituted_limit,
                ..
            }] => {
                assert_eq!(*since, NOW + 60);
                assert_eq!(*substituted_limit, 100);
            }
            other => panic!("unexpected anomalies: {:?}", other),
        }
    }

    // =============================================================================
    // FIXTURE INSERTS
    // =============================================================================

    #[tokio::test]
    async fn test_insert_with_ttl_visible_until_expiry() {
        let h = harness(HistoryConfig::default());
        h.acl.grant("u1", "chat/ttl");
        let ctx = RequestContext::new();
        let bucket = BucketClock::default().get(NOW);
        h.driver
            .insert_with_ttl(&ctx, "chat/ttl", "hello", bucket, Duration::from_secs(30))
            .await
            .unwrap();

        let got = h
            .service
            .fetch_single_topic(&ctx, "u1", "chat/ttl", 0, 0, &MessageFilters::default())
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].payload_text(), "hello");

        h.time.advance(31);
        let got = h
            .service
            .fetch_single_topic(&ctx, "u1", "chat/ttl", 0, 0, &MessageFilters::default())
            .await
            .unwrap();
        assert!(got.is_empty());
    }

    // =============================================================================
    // CANCELLATION
    // =============================================================================

    fn slow_service() -> (HistoryService, Arc<ScriptedMessageStore>) {
        let store = Arc::new(
            ScriptedMessageStore::new()
                .with_topic("room/1", messages("room/1", NOW, 3))
                .with_delay("room/1", Duration::from_secs(30))
                .with_topic("room/2", messages("room/2", NOW, 3))
                .with_delay("room/2", Duration::from_secs(30)),
        );
        let acl = Arc::new(InMemoryAclSource::new());
        acl.grant("u1", "room/+");
        let service = HistoryService::new(HistoryConfig::default(), store.clone(), acl)
            .with_time_source(Arc::new(FixedTimeSource::new(NOW)));
        (service, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_through_service() {
        let (service, store) = slow_service();
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(250));

        let err = service
            .fetch_multi_topic(&ctx, "u1", "room", &suffixes(&["1", "2"]), 0, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, HistoryError::DeadlineExceeded));
        assert_eq!(store.completed_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_cancel_through_service() {
        let (service, store) = slow_service();
        let token = CancellationToken::new();
        let ctx = RequestContext::with_token(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = service
            .fetch_multi_topic(&ctx, "u1", "room", &suffixes(&["1", "2"]), 0, 0)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), HistoryErrorKind::Cancelled);
        assert_eq!(store.completed_calls(), 0);
    }
}
