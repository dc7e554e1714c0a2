//! Consumer group protocol: read new entries, acknowledge, claim stale ones.
//!
//! Delivery is at-least-once. A read moves entries into the group's pending
//! set owned by the reading consumer; an ack removes them; a claim hands
//! entries idle past a threshold to another consumer.
//!
//! Read and ack fail the whole request on any engine error. Claim is a
//! recovery tool and is best-effort: a partition whose engine call fails is
//! logged and skipped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::ReadEvent;
use crate::keyspace::Keyspace;
use crate::metrics;
use crate::service::StreamService;
use crate::validate;

fn default_count() -> usize {
    100
}

fn default_block_ms() -> u64 {
    1000
}

fn default_min_idle_ms() -> u64 {
    60_000
}

fn default_claim_start() -> String {
    "0-0".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub consumer: String,
    /// Maximum entries per partition.
    #[serde(default = "default_count")]
    pub count: usize,
    /// How long to wait when nothing is available; 0 returns immediately.
    #[serde(default = "default_block_ms")]
    pub block_ms: u64,
    #[serde(default)]
    pub partitions: Option<Vec<u32>>,
}

impl ReadRequest {
    pub fn new(consumer: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            count: default_count(),
            block_ms: default_block_ms(),
            partitions: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_block_ms(mut self, block_ms: u64) -> Self {
        self.block_ms = block_ms;
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<u32>) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate::text("consumer", &self.consumer, 1, validate::MAX_NAME_LEN)?;
        validate::range("count", self.count, 1, validate::MAX_COUNT)?;
        validate::range("block_ms", self.block_ms, 0, validate::MAX_BLOCK_MS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub topic: String,
    pub group: String,
    pub consumer: String,
    pub events: Vec<ReadEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckItem {
    pub partition: u32,
    pub redis_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub items: Vec<AckItem>,
}

impl AckRequest {
    pub fn validate(&self) -> Result<()> {
        validate::range("items", self.items.len(), 1, validate::MAX_ACK_ITEMS)?;
        for item in &self.items {
            validate::range("redis_ids", item.redis_ids.len(), 1, validate::MAX_IDS_PER_ACK_ITEM)?;
            for id in &item.redis_ids {
                validate::entry_id("redis_ids", id)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub topic: String,
    pub group: String,
    pub acked: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub consumer: String,
    #[serde(default = "default_min_idle_ms")]
    pub min_idle_ms: u64,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Pending-set cursor to scan from; `0-0` starts at the beginning.
    #[serde(default = "default_claim_start")]
    pub start_id: String,
    #[serde(default)]
    pub partitions: Option<Vec<u32>>,
}

impl ClaimRequest {
    pub fn new(consumer: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            min_idle_ms: default_min_idle_ms(),
            count: default_count(),
            start_id: default_claim_start(),
            partitions: None,
        }
    }

    pub fn with_min_idle_ms(mut self, min_idle_ms: u64) -> Self {
        self.min_idle_ms = min_idle_ms;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_start_id(mut self, start_id: impl Into<String>) -> Self {
        self.start_id = start_id.into();
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<u32>) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate::text("consumer", &self.consumer, 1, validate::MAX_NAME_LEN)?;
        validate::range("min_idle_ms", self.min_idle_ms, 0, validate::MAX_MIN_IDLE_MS)?;
        validate::range("count", self.count, 1, validate::MAX_COUNT)?;
        validate::entry_id("start_id", &self.start_id)?;
        Ok(())
    }
}

/// Where to resume a claim scan on one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionCursor {
    pub partition: u32,
    /// `0-0` once the partition's pending set has been fully scanned.
    pub next_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub topic: String,
    pub group: String,
    pub consumer: String,
    pub claimed: usize,
    pub events: Vec<ReadEvent>,
    /// Only partitions that answered appear here.
    pub cursors: Vec<PartitionCursor>,
}

impl StreamService {
    /// Deliver entries never seen by `group`, across the requested partitions.
    ///
    /// Events come back grouped by partition in request order, and in id
    /// order within each partition.
    pub async fn read(&self, topic: &str, group: &str, request: &ReadRequest) -> Result<ReadResponse> {
        validate::name("topic", topic)?;
        validate::name("group", group)?;
        request.validate()?;

        let count = self.registry.partition_count(topic).await?;
        if let Some(parts) = &request.partitions {
            validate::partitions(parts, count)?;
        }
        let partitions = Self::scope(request.partitions.as_deref(), count);
        let logs = self.logs_for(topic, &partitions);

        let block = (request.block_ms > 0).then(|| Duration::from_millis(request.block_ms));
        let batches = self
            .engine
            .read_group(group, &request.consumer, &logs, request.count, block)
            .await?;

        let events: Vec<ReadEvent> = batches
            .into_iter()
            .flat_map(|batch| {
                let partition = Keyspace::partition_of(&batch.log);
                batch
                    .entries
                    .into_iter()
                    .map(move |entry| ReadEvent::from_entry(partition, entry))
            })
            .collect();

        if !events.is_empty() {
            debug!(topic, group, consumer = %request.consumer, events = events.len(), "Delivered events");
            metrics::record_read(topic, group, events.len());
        }

        Ok(ReadResponse {
            topic: topic.to_string(),
            group: group.to_string(),
            consumer: request.consumer.clone(),
            events,
        })
    }

    /// Remove ids from the group's pending sets. Already-acknowledged or
    /// unknown ids count 0, so retrying is safe.
    pub async fn ack(&self, topic: &str, group: &str, request: &AckRequest) -> Result<AckResponse> {
        validate::name("topic", topic)?;
        validate::name("group", group)?;
        request.validate()?;

        let count = self.registry.partition_count(topic).await?;
        let requested: Vec<u32> = request.items.iter().map(|item| item.partition).collect();
        validate::partitions(&requested, count)?;

        let mut acked = 0;
        for item in &request.items {
            let log = self.keys.partition_log(topic, item.partition);
            acked += self.engine.ack(&log, group, &item.redis_ids).await?;
        }

        if acked > 0 {
            metrics::record_acked(topic, group, acked);
        }

        Ok(AckResponse {
            topic: topic.to_string(),
            group: group.to_string(),
            acked,
        })
    }

    /// Hand pending entries idle for at least `min_idle_ms` to `consumer`.
    ///
    /// Each partition is scanned once from `start_id`; callers continue with
    /// the returned cursors. Partitions whose engine call fails are skipped.
    pub async fn claim(&self, topic: &str, group: &str, request: &ClaimRequest) -> Result<ClaimResponse> {
        validate::name("topic", topic)?;
        validate::name("group", group)?;
        request.validate()?;

        let count = self.registry.partition_count(topic).await?;
        if let Some(parts) = &request.partitions {
            validate::partitions(parts, count)?;
        }
        let partitions = Self::scope(request.partitions.as_deref(), count);
        let min_idle = Duration::from_millis(request.min_idle_ms);

        let mut events = Vec::new();
        let mut cursors = Vec::new();
        for partition in partitions {
            let log = self.keys.partition_log(topic, partition);
            let claimed = match self
                .engine
                .auto_claim(&log, group, &request.consumer, min_idle, &request.start_id, request.count)
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    warn!(topic, group, partition, error = %e, "Skipping partition during claim");
                    continue;
                }
            };

            events.extend(
                claimed
                    .entries
                    .into_iter()
                    .map(|entry| ReadEvent::from_entry(partition, entry)),
            );
            cursors.push(PartitionCursor {
                partition,
                next_id: claimed.next_cursor,
            });
        }

        if !events.is_empty() {
            debug!(topic, group, consumer = %request.consumer, claimed = events.len(), "Claimed stale entries");
        }

        Ok(ClaimResponse {
            topic: topic.to_string(),
            group: group.to_string(),
            consumer: request.consumer.clone(),
            claimed: events.len(),
            events,
            cursors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::error::StreamError;
    use crate::event::EventIn;
    use crate::ingest::IngestRequest;
    use crate::lifecycle::GroupCreateRequest;
    use crate::service::test_support::{service, service_with};
    use openstream_log::InMemoryLogEngine;
    use serde_json::json;
    use std::sync::Arc;

    async fn setup(partitions: u32) -> (Arc<InMemoryLogEngine>, StreamService) {
        let (engine, service) = service();
        service
            .create_group(
                "orders",
                &GroupCreateRequest::new("billing")
                    .with_start_id("0-0")
                    .with_partitions(partitions),
            )
            .await
            .unwrap();
        (engine, service)
    }

    async fn ingest(service: &StreamService, keys: &[&str]) -> Vec<String> {
        let events = keys
            .iter()
            .map(|k| EventIn::new("order.created").with_key(*k))
            .collect();
        service
            .ingest("orders", &IngestRequest::new(events))
            .await
            .unwrap()
            .results
            .into_iter()
            .map(|r| r.redis_id)
            .collect()
    }

    fn nonblocking(consumer: &str) -> ReadRequest {
        ReadRequest::new(consumer).with_block_ms(0).with_count(10)
    }

    #[tokio::test]
    async fn end_to_end_orders_scenario() {
        let (_, service) = service_with(StreamConfig::default().with_max_stream_len(1000));
        let payload = json!({"sku": "x-1", "qty": 2}).as_object().cloned().unwrap();

        let first = service
            .ingest(
                "orders",
                &IngestRequest::new(vec![EventIn::new("order.created").with_key("A").with_payload(payload.clone())])
                    .with_partitions(4),
            )
            .await
            .unwrap();
        let second = service
            .ingest(
                "orders",
                &IngestRequest::new(vec![EventIn::new("order.paid").with_key("A").with_payload(payload)]),
            )
            .await
            .unwrap();
        let p1 = first.results[0].partition;
        assert_eq!(second.results[0].partition, p1);

        service
            .create_group("orders", &GroupCreateRequest::new("billing").with_start_id("0-0"))
            .await
            .unwrap();

        let read = service.read("orders", "billing", &nonblocking("c1")).await.unwrap();
        assert_eq!(read.events.len(), 2);
        assert_eq!(read.events[0].event_type.as_deref(), Some("order.created"));
        assert_eq!(read.events[1].event_type.as_deref(), Some("order.paid"));
        assert_eq!(read.events[0].payload(), Some(json!({"sku": "x-1", "qty": 2})));
        assert!(read.events.iter().all(|e| e.partition == p1));

        let ack = AckRequest {
            items: vec![AckItem {
                partition: p1,
                redis_ids: read.events.iter().map(|e| e.redis_id.clone()).collect(),
            }],
        };
        assert_eq!(service.ack("orders", "billing", &ack).await.unwrap().acked, 2);

        let again = service.read("orders", "billing", &nonblocking("c1")).await.unwrap();
        assert!(again.events.is_empty());
    }

    #[tokio::test]
    async fn read_preserves_partition_then_id_order() {
        let (_, service) = setup(4).await;
        ingest(&service, &["A", "B", "A", "B"]).await;

        let read = service
            .read("orders", "billing", &nonblocking("c").with_partitions(vec![3, 2]))
            .await
            .unwrap();
        let partitions: Vec<u32> = read.events.iter().map(|e| e.partition).collect();
        assert_eq!(partitions, vec![3, 3, 2, 2]);
    }

    #[tokio::test]
    async fn count_caps_entries_per_partition() {
        let (_, service) = setup(4).await;
        ingest(&service, &["A", "A", "A", "B", "B", "B"]).await;

        let read = service
            .read("orders", "billing", &nonblocking("c").with_count(2))
            .await
            .unwrap();
        assert_eq!(read.events.len(), 4);
    }

    #[tokio::test]
    async fn ack_is_idempotent() {
        let (_, service) = setup(4).await;
        let ids = ingest(&service, &["A"]).await;
        service.read("orders", "billing", &nonblocking("c")).await.unwrap();

        let ack = AckRequest {
            items: vec![AckItem {
                partition: 2,
                redis_ids: ids,
            }],
        };
        assert_eq!(service.ack("orders", "billing", &ack).await.unwrap().acked, 1);
        assert_eq!(service.ack("orders", "billing", &ack).await.unwrap().acked, 0);
    }

    #[tokio::test]
    async fn ack_of_never_delivered_id_counts_zero() {
        let (_, service) = setup(4).await;
        let ack = AckRequest {
            items: vec![AckItem {
                partition: 0,
                redis_ids: vec!["1-0".to_string()],
            }],
        };
        assert_eq!(service.ack("orders", "billing", &ack).await.unwrap().acked, 0);
    }

    #[tokio::test]
    async fn read_without_group_is_an_engine_error() {
        let (_, service) = setup(4).await;
        let err = service.read("orders", "nobody", &nonblocking("c")).await.unwrap_err();
        assert!(matches!(err, StreamError::Engine(_)));
    }

    #[tokio::test]
    async fn read_fails_whole_request_on_one_bad_partition() {
        let (engine, service) = setup(4).await;
        ingest(&service, &["A"]).await;
        engine.fail_log("os:stream:orders:1").await;

        let err = service.read("orders", "billing", &nonblocking("c")).await.unwrap_err();
        assert!(matches!(err, StreamError::Engine(_)));
    }

    #[tokio::test]
    async fn ack_fails_fast() {
        let (engine, service) = setup(4).await;
        engine.fail_log("os:stream:orders:1").await;
        let ack = AckRequest {
            items: vec![AckItem {
                partition: 1,
                redis_ids: vec!["1-0".to_string()],
            }],
        };
        assert!(matches!(
            service.ack("orders", "billing", &ack).await,
            Err(StreamError::Engine(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn claim_only_takes_idle_entries() {
        let (engine, service) = setup(4).await;
        let ids = ingest(&service, &["A", "A"]).await;
        service.read("orders", "billing", &nonblocking("crashed")).await.unwrap();

        // Acked entries are never claimable.
        service
            .ack(
                "orders",
                "billing",
                &AckRequest {
                    items: vec![AckItem {
                        partition: 2,
                        redis_ids: vec![ids[0].clone()],
                    }],
                },
            )
            .await
            .unwrap();

        let claim = ClaimRequest::new("rescuer").with_min_idle_ms(60_000);
        let early = service.claim("orders", "billing", &claim).await.unwrap();
        assert_eq!(early.claimed, 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        let late = service.claim("orders", "billing", &claim).await.unwrap();
        assert_eq!(late.claimed, 1);
        assert_eq!(late.events[0].redis_id, ids[1]);
        assert_eq!(late.events[0].partition, 2);
        assert_eq!(
            engine.pending_owner("os:stream:orders:2", "billing", &ids[1]).await.as_deref(),
            Some("rescuer")
        );

        // Ownership moved and idle time reset.
        let repeat = service.claim("orders", "billing", &claim).await.unwrap();
        assert_eq!(repeat.claimed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_skips_failing_partition() {
        let (engine, service) = setup(4).await;
        ingest(&service, &["A", "B"]).await;
        service.read("orders", "billing", &nonblocking("crashed")).await.unwrap();
        engine.fail_log("os:stream:orders:3").await;

        let claim = ClaimRequest::new("rescuer").with_min_idle_ms(0);
        let response = service.claim("orders", "billing", &claim).await.unwrap();

        assert_eq!(response.claimed, 1);
        assert_eq!(response.events[0].partition, 2);
        let answered: Vec<u32> = response.cursors.iter().map(|c| c.partition).collect();
        assert_eq!(answered, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_returns_continuation_cursor() {
        let (_, service) = setup(4).await;
        ingest(&service, &["A", "A", "A"]).await;
        service.read("orders", "billing", &nonblocking("crashed")).await.unwrap();

        let claim = ClaimRequest::new("rescuer")
            .with_min_idle_ms(0)
            .with_count(2)
            .with_partitions(vec![2]);
        let first = service.claim("orders", "billing", &claim).await.unwrap();
        assert_eq!(first.claimed, 2);
        let cursor = &first.cursors[0];
        assert_eq!(cursor.partition, 2);
        assert_ne!(cursor.next_id, "0-0");

        let rest = service
            .claim("orders", "billing", &claim.clone().with_start_id(cursor.next_id.clone()))
            .await
            .unwrap();
        assert_eq!(rest.claimed, 1);
        assert_eq!(rest.cursors[0].next_id, "0-0");
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_read_wakes_on_ingest() {
        let (_, service) = setup(4).await;
        let reader = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .read("orders", "billing", &ReadRequest::new("c").with_block_ms(5_000))
                    .await
            })
        };
        tokio::task::yield_now().await;
        ingest(&service, &["A"]).await;

        let read = reader.await.unwrap().unwrap();
        assert_eq!(read.events.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_read_times_out_empty() {
        let (_, service) = setup(4).await;
        let read = service
            .read("orders", "billing", &ReadRequest::new("c").with_block_ms(200))
            .await
            .unwrap();
        assert!(read.events.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_partitions_are_rejected() {
        let (_, service) = setup(4).await;
        let read = service
            .read("orders", "billing", &nonblocking("c").with_partitions(vec![4]))
            .await;
        assert!(matches!(read, Err(StreamError::Validation(_))));

        let ack = AckRequest {
            items: vec![AckItem {
                partition: 9,
                redis_ids: vec!["1-0".to_string()],
            }],
        };
        assert!(matches!(
            service.ack("orders", "billing", &ack).await,
            Err(StreamError::Validation(_))
        ));
    }

    #[test]
    fn request_bounds() {
        assert!(ReadRequest::new("").validate().is_err());
        assert!(ReadRequest::new("c").with_count(0).validate().is_err());
        assert!(ReadRequest::new("c").with_block_ms(30_001).validate().is_err());
        assert!(ClaimRequest::new("c").with_start_id("abc").validate().is_err());
        assert!(ClaimRequest::new("c").with_min_idle_ms(86_400_001).validate().is_err());
        assert!(AckRequest { items: vec![] }.validate().is_err());
        assert!(
            AckRequest {
                items: vec![AckItem {
                    partition: 0,
                    redis_ids: vec!["not-an-id".to_string()],
                }],
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn request_defaults_from_json() {
        let read: ReadRequest = serde_json::from_value(json!({"consumer": "c"})).unwrap();
        assert_eq!((read.count, read.block_ms, read.partitions), (100, 1000, None));

        let claim: ClaimRequest = serde_json::from_value(json!({"consumer": "c"})).unwrap();
        assert_eq!(claim.min_idle_ms, 60_000);
        assert_eq!(claim.start_id, "0-0");
    }
}
