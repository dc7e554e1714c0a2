//! Integration tests requiring a running Redis server (6.2 or newer).
//!
//! Run with: cargo test -p openstream-log --test redis_integration -- --ignored
//!
//! Set `OPENSTREAM_TEST_REDIS_URL` to point at a server other than
//! `redis://localhost:6379/15`. Every test uses its own keys.

use std::time::Duration;

use openstream_log::{EngineConfig, Fields, LogEngine, RedisLogEngine};

fn engine() -> RedisLogEngine {
    let url = std::env::var("OPENSTREAM_TEST_REDIS_URL")
        .unwrap_or_else(|_| "redis://localhost:6379/15".to_string());
    RedisLogEngine::new(EngineConfig::default().with_redis_url(url)).unwrap()
}

fn unique(name: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("os-test:{name}:{nanos}")
}

fn fields(event_type: &str) -> Fields {
    Fields::from([("event_type".to_string(), event_type.to_string())])
}

#[tokio::test]
#[ignore]
async fn append_then_len() {
    let engine = engine();
    let log = unique("len");

    assert_eq!(engine.len(&log).await.unwrap(), 0);
    let first = engine.append(&log, &fields("a")).await.unwrap();
    let second = engine.append(&log, &fields("b")).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.len(&log).await.unwrap(), 2);
}

#[tokio::test]
#[ignore]
async fn group_read_ack_roundtrip() {
    let engine = engine();
    let log = unique("read");

    engine.create_group(&log, "g", "0-0", true).await.unwrap();
    let id = engine.append(&log, &fields("a")).await.unwrap();

    let batches = engine
        .read_group("g", "c1", &[log.clone()], 10, None)
        .await
        .unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].entries[0].id, id);
    assert_eq!(batches[0].entries[0].fields["event_type"], "a");

    // Already delivered: a second read sees nothing.
    let again = engine
        .read_group("g", "c2", &[log.clone()], 10, None)
        .await
        .unwrap();
    assert!(again.iter().all(|b| b.entries.is_empty()));

    assert_eq!(engine.ack(&log, "g", &[id.clone()]).await.unwrap(), 1);
    assert_eq!(engine.ack(&log, "g", &[id]).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn blocking_read_times_out_empty() {
    let engine = engine();
    let log = unique("block");
    engine.create_group(&log, "g", "$", true).await.unwrap();

    let batches = engine
        .read_group("g", "c", &[log], 10, Some(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(batches.iter().all(|b| b.entries.is_empty()));
}

#[tokio::test]
#[ignore]
async fn duplicate_group_is_reported() {
    let engine = engine();
    let log = unique("dup");

    engine.create_group(&log, "g", "$", true).await.unwrap();
    let err = engine.create_group(&log, "g", "$", true).await.unwrap_err();
    assert!(err.is_group_exists());
}

#[tokio::test]
#[ignore]
async fn auto_claim_moves_ownership() {
    let engine = engine();
    let log = unique("claim");

    engine.create_group(&log, "g", "0-0", true).await.unwrap();
    let id = engine.append(&log, &fields("a")).await.unwrap();
    engine
        .read_group("g", "dead", &[log.clone()], 10, None)
        .await
        .unwrap();

    let claimed = engine
        .auto_claim(&log, "g", "rescuer", Duration::ZERO, "0-0", 10)
        .await
        .unwrap();
    assert_eq!(claimed.entries.len(), 1);
    assert_eq!(claimed.entries[0].id, id);
    assert_eq!(claimed.next_cursor, "0-0");
}

#[tokio::test]
#[ignore]
async fn metadata_and_sets() {
    let engine = engine();
    let meta = unique("meta");
    let set = unique("set");

    assert!(engine.set_meta_if_absent(&meta, "partitions", "4").await.unwrap());
    assert!(!engine.set_meta_if_absent(&meta, "partitions", "8").await.unwrap());
    assert_eq!(
        engine.get_meta(&meta, "partitions").await.unwrap().as_deref(),
        Some("4")
    );

    engine.add_to_set(&set, "orders").await.unwrap();
    engine.add_to_set(&set, "orders").await.unwrap();
    assert_eq!(engine.set_members(&set).await.unwrap(), vec!["orders"]);
}

#[tokio::test]
#[ignore]
async fn group_info_reports_pending() {
    let engine = engine();
    let log = unique("info");

    assert!(engine.group_info(&log).await.unwrap().is_empty());

    engine.create_group(&log, "g", "0-0", true).await.unwrap();
    engine.append(&log, &fields("a")).await.unwrap();
    engine
        .read_group("g", "c", &[log.clone()], 10, None)
        .await
        .unwrap();

    let info = engine.group_info(&log).await.unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].name, "g");
    assert_eq!(info[0].pending, 1);
    assert_eq!(info[0].consumers, 1);
}
