//! Counters and histograms emitted by the coordination layer.
//!
//! Emission goes through the `metrics` facade; nothing is recorded until a
//! recorder (the Prometheus exporter in the server) is installed.

use std::time::Duration;

use ::metrics::{counter, describe_counter, describe_histogram, histogram};

pub const INGEST_EVENTS_TOTAL: &str = "openstream_ingest_events_total";
pub const INGEST_BYTES_TOTAL: &str = "openstream_ingest_bytes_total";
pub const INGEST_REQUESTS_TOTAL: &str = "openstream_ingest_requests_total";
pub const CONSUMER_READ_EVENTS_TOTAL: &str = "openstream_consumer_read_events_total";
pub const CONSUMER_ACK_TOTAL: &str = "openstream_consumer_ack_total";
pub const HTTP_REQUEST_DURATION: &str = "openstream_http_request_duration_seconds";

/// Outcome label for ingest requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Ok,
    Backpressure,
    Error,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStatus::Ok => "ok",
            IngestStatus::Backpressure => "backpressure",
            IngestStatus::Error => "error",
        }
    }
}

/// Register descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(INGEST_EVENTS_TOTAL, "Events ingested");
    describe_counter!(INGEST_BYTES_TOTAL, "Approximate payload bytes ingested");
    describe_counter!(INGEST_REQUESTS_TOTAL, "Ingest requests by outcome");
    describe_counter!(CONSUMER_READ_EVENTS_TOTAL, "Events delivered to consumers");
    describe_counter!(CONSUMER_ACK_TOTAL, "Events acknowledged by consumers");
    describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request duration in seconds");
}

pub fn record_ingested(topic: &str, partition: u32, payload_bytes: usize) {
    let partition = partition.to_string();
    counter!(INGEST_EVENTS_TOTAL, "topic" => topic.to_string(), "partition" => partition.clone())
        .increment(1);
    counter!(INGEST_BYTES_TOTAL, "topic" => topic.to_string(), "partition" => partition)
        .increment(payload_bytes as u64);
}

pub fn record_ingest_request(status: IngestStatus) {
    counter!(INGEST_REQUESTS_TOTAL, "status" => status.as_str()).increment(1);
}

pub fn record_read(topic: &str, group: &str, events: usize) {
    counter!(CONSUMER_READ_EVENTS_TOTAL, "topic" => topic.to_string(), "group" => group.to_string())
        .increment(events as u64);
}

pub fn record_acked(topic: &str, group: &str, acked: u64) {
    counter!(CONSUMER_ACK_TOTAL, "topic" => topic.to_string(), "group" => group.to_string())
        .increment(acked);
}

/// `path` is the matched route template, not the raw URI.
pub fn record_http_request(method: &str, path: &str, elapsed: Duration) {
    histogram!(HTTP_REQUEST_DURATION, "method" => method.to_string(), "path" => path.to_string())
        .record(elapsed.as_secs_f64());
}
