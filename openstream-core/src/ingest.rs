//! Ingestion pipeline.
//!
//! Events in a batch are routed and appended strictly one after another, so
//! append order within a partition matches submission order. The first
//! failure (backpressure or engine error) fails the whole request. Events
//! appended before the failure stay in the log but are not reported;
//! callers must treat ingestion as at-least-once and safe to retry.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StreamError};
use crate::event::{EventIn, IngestedEvent};
use crate::metrics::{self, IngestStatus};
use crate::router::partition_for;
use crate::service::StreamService;
use crate::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<EventIn>,
    /// Partition count to use; falls back to the recorded count.
    #[serde(default)]
    pub partitions: Option<u32>,
}

impl IngestRequest {
    pub fn new(events: Vec<EventIn>) -> Self {
        Self {
            events,
            partitions: None,
        }
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate::range("events", self.events.len(), 1, validate::MAX_EVENTS_PER_REQUEST)?;
        if let Some(p) = self.partitions {
            validate::range("partitions", p, 1, validate::MAX_PARTITIONS)?;
        }
        self.events.iter().try_for_each(EventIn::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub topic: String,
    pub partitions: u32,
    /// One result per input event, in input order.
    pub results: Vec<IngestedEvent>,
}

impl StreamService {
    /// Append a batch of events to `topic`.
    pub async fn ingest(&self, topic: &str, request: &IngestRequest) -> Result<IngestResponse> {
        validate::name("topic", topic)?;
        request.validate()?;

        let outcome = self.append_batch(topic, request).await;
        let status = match &outcome {
            Ok(_) => IngestStatus::Ok,
            Err(StreamError::Backpressure { .. }) => IngestStatus::Backpressure,
            Err(_) => IngestStatus::Error,
        };
        metrics::record_ingest_request(status);
        outcome
    }

    async fn append_batch(&self, topic: &str, request: &IngestRequest) -> Result<IngestResponse> {
        let partitions = match request.partitions {
            Some(p) => p,
            None => self.registry.partition_count(topic).await?,
        };
        self.registry.ensure_topic(topic, partitions).await?;

        let max_len = self.config.backpressure_max_stream_len;
        let mut results = Vec::with_capacity(request.events.len());

        for event in &request.events {
            let partition = partition_for(topic, event.routing_key(), partitions);
            let log = self.keys.partition_log(topic, partition);

            if max_len > 0 {
                let length = self.engine.len(&log).await?;
                if length >= max_len {
                    warn!(topic, partition, length, "Rejecting ingest: partition at max length");
                    return Err(StreamError::Backpressure {
                        topic: topic.to_string(),
                        partition,
                        length,
                    });
                }
            }

            let (fields, payload_bytes) = event.to_fields()?;
            let redis_id = self.engine.append(&log, &fields).await?;
            metrics::record_ingested(topic, partition, payload_bytes);
            results.push(IngestedEvent {
                partition,
                redis_id,
            });
        }

        debug!(topic, events = results.len(), "Ingested batch");
        Ok(IngestResponse {
            topic: topic.to_string(),
            partitions,
            results,
        })
    }
}
