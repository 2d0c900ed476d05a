//! Integration tests for [`RedisLogStore`] with a real Redis instance.
//!
//! These tests use testcontainers to spin up Redis and validate:
//! - Produce, consume, acknowledge round-trip
//! - Redelivery of unacknowledged messages to the same consumer
//! - Reclaiming a stale message from another consumer
//! - Idempotent group creation and cascading deletion
//! - Status snapshots and stream discovery
//!
//! # Running These Tests
//!
//! These tests are marked as `#[ignore]` by default because they require
//! Docker to be running (for testcontainers).
//!
//! To run explicitly:
//! ```bash
//! cargo test -p streamgate-redis --test integration_tests -- --ignored
//! ```
//!
//! # Panics
//!
//! These tests use `expect()` and `panic!()` for setup failures, which is acceptable in test code.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use futures::StreamExt;
use std::time::Duration;
use streamgate_core::{Gateway, GatewayConfig, GatewayError, StartId};
use streamgate_redis::RedisLogStore;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::redis::{REDIS_PORT, Redis};

/// Short block so empty polls return quickly.
const BLOCK: Duration = Duration::from_millis(100);

/// Start a Redis container and return a gateway connected to it.
///
/// Returns both the container (to keep it alive) and the gateway.
///
/// # Panics
/// Panics if container setup fails (test environment issue).
async fn setup_gateway() -> (ContainerAsync<Redis>, Gateway<RedisLogStore>) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start Redis container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(REDIS_PORT)
        .await
        .expect("Failed to get port");

    let store = RedisLogStore::new(&format!("redis://{host}:{port}"))
        .await
        .expect("Failed to connect to Redis");
    let config = GatewayConfig {
        block_ms: 100,
        ..GatewayConfig::default()
    };
    let gateway = Gateway::new(store, config).expect("Invalid gateway config");

    (container, gateway)
}

#[tokio::test]
#[ignore]
async fn test_produce_consume_ack_round_trip() {
    let (_container, gateway) = setup_gateway().await;

    assert!(gateway
        .ensure_group("orders", StartId::Latest, false)
        .await
        .expect("ensure_group failed"));

    let id = gateway
        .produce("orders", b"order1", None, true)
        .await
        .expect("produce failed");

    let message = gateway
        .consume("orders", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message delivered");
    assert_eq!(message.id, id);
    assert_eq!(message.payload(), Some(&b"order1"[..]));

    let acknowledged = gateway.ack("orders", &[id]).await.expect("ack failed");
    assert_eq!(acknowledged, 1);

    let next = gateway
        .consume("orders", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed");
    assert!(next.is_none());

    let info = gateway.stream_info("orders").await.expect("stream_info failed");
    assert_eq!(info.length, 1);
    assert_eq!(info.groups, 1);
    assert_eq!(info.last_generated_id, id);
}

#[tokio::test]
#[ignore]
async fn test_unacknowledged_message_is_redelivered_first() {
    let (_container, gateway) = setup_gateway().await;
    gateway
        .ensure_group("jobs", StartId::Latest, false)
        .await
        .expect("ensure_group failed");

    let first = gateway.produce("jobs", b"a", None, true).await.expect("produce failed");
    let second = gateway.produce("jobs", b"b", None, true).await.expect("produce failed");

    let delivered = gateway
        .consume("jobs", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message");
    assert_eq!(delivered.id, first);

    // Not acknowledged: the same consumer gets it back before `second`.
    let again = gateway
        .consume("jobs", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message");
    assert_eq!(again.id, first);

    gateway.ack("jobs", &[first]).await.expect("ack failed");
    let next = gateway
        .consume("jobs", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message");
    assert_eq!(next.id, second);
}

#[tokio::test]
#[ignore]
async fn test_reclaim_moves_stale_message() {
    let (_container, gateway) = setup_gateway().await;
    gateway
        .ensure_group("mail", StartId::Latest, false)
        .await
        .expect("ensure_group failed");

    let id = gateway.produce("mail", b"m1", None, true).await.expect("produce failed");
    gateway
        .consume("mail", "dead-worker", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message");

    tokio::time::sleep(Duration::from_millis(200)).await;

    let pending = gateway
        .list_pending("mail", Duration::from_millis(100))
        .await
        .expect("list_pending failed");
    assert_eq!(pending.owned_by("dead-worker"), &[id]);

    let moved = gateway
        .reclaim_one("mail", "worker-2", Duration::from_millis(100))
        .await
        .expect("reclaim_one failed");
    assert!(moved);

    let message = gateway
        .consume("mail", "worker-2", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("reclaimed message not redelivered");
    assert_eq!(message.id, id);

    let moved_again = gateway
        .reclaim_one("mail", "worker-2", Duration::ZERO)
        .await
        .expect("reclaim_one failed");
    assert!(!moved_again);
}

#[tokio::test]
#[ignore]
async fn test_ensure_group_is_idempotent_and_keeps_position() {
    let (_container, gateway) = setup_gateway().await;

    gateway
        .ensure_group("events", StartId::Latest, false)
        .await
        .expect("first ensure_group failed");
    let id = gateway.produce("events", b"e1", None, true).await.expect("produce failed");

    // A second call with a different start must not rewind the group.
    gateway
        .ensure_group("events", StartId::Beginning, false)
        .await
        .expect("second ensure_group failed");

    let groups = gateway.list_groups("events").await.expect("list_groups failed");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "events-group");

    let message = gateway
        .consume("events", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed")
        .expect("no message");
    assert_eq!(message.id, id);
}

#[tokio::test]
#[ignore]
async fn test_delete_queue_cascades() {
    let (_container, gateway) = setup_gateway().await;
    gateway
        .ensure_group("tmp", StartId::Latest, false)
        .await
        .expect("ensure_group failed");
    gateway.produce("tmp", b"x", None, true).await.expect("produce failed");
    assert!(gateway.stream_exists("tmp").await.expect("stream_exists failed"));

    gateway.delete_queue("tmp").await.expect("delete_queue failed");
    assert!(!gateway.stream_exists("tmp").await.expect("stream_exists failed"));

    let err = gateway
        .delete_group("tmp")
        .await
        .expect_err("deleting a missing group must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore]
async fn test_status_reports_stream_group_and_consumers() {
    let (_container, gateway) = setup_gateway().await;
    gateway
        .ensure_group("audit", StartId::Latest, false)
        .await
        .expect("ensure_group failed");
    gateway.produce("audit", b"r1", None, true).await.expect("produce failed");
    gateway
        .consume("audit", "worker-1", Some(BLOCK))
        .await
        .expect("consume failed");

    let status = gateway.status("audit").await.expect("status failed");
    assert_eq!(status.info.length, 1);
    assert_eq!(status.groups.len(), 1);
    assert_eq!(status.groups[0].pending, 1);
    assert_eq!(status.consumers.len(), 1);
    assert_eq!(status.consumers[0].name, "worker-1");
    assert_eq!(status.consumers[0].pending, 1);
}

#[tokio::test]
#[ignore]
async fn test_trimmed_produce_keeps_stream_bounded() {
    let (_container, gateway) = setup_gateway().await;
    for i in 0..20_u8 {
        gateway
            .produce("bounded", &[i], Some(5), false)
            .await
            .expect("produce failed");
    }

    let info = gateway.stream_info("bounded").await.expect("stream_info failed");
    assert_eq!(info.length, 5);
    let last = info.last_entry.expect("stream is not empty");
    assert_eq!(last.payload(), Some(&[19_u8][..]));
}

#[tokio::test]
#[ignore]
async fn test_values_round_trip_and_expire() {
    let (_container, gateway) = setup_gateway().await;

    gateway
        .value_set("lock", b"holder", Some(Duration::from_millis(100)))
        .await
        .expect("value_set failed");
    let value = gateway.value_get("lock").await.expect("value_get failed");
    assert_eq!(value.as_deref(), Some(&b"holder"[..]));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(gateway.value_get("lock").await.expect("value_get failed"), None);
}

#[tokio::test]
#[ignore]
async fn test_message_stream_ends_after_close() {
    let (_container, gateway) = setup_gateway().await;
    gateway
        .ensure_group("feed", StartId::Latest, false)
        .await
        .expect("ensure_group failed");
    let id = gateway.produce("feed", b"f1", None, true).await.expect("produce failed");

    {
        let mut messages = gateway.messages("feed", "worker-1");
        let first = tokio::time::timeout(Duration::from_secs(5), messages.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended early")
            .expect("consume failed");
        assert_eq!(first.id, id);
    }

    gateway.close().await;

    let mut messages = gateway.messages("feed", "worker-1");
    let err = messages
        .next()
        .await
        .expect("stream must yield the close error")
        .expect_err("closed gateway must fail");
    assert_eq!(err, GatewayError::Closed);
    assert!(messages.next().await.is_none());
}
