//! Event shapes and their persisted field encoding.
//!
//! Each appended entry carries:
//!
//! | field          | content                                   |
//! |----------------|-------------------------------------------|
//! | `event_type`   | as submitted                              |
//! | `payload_json` | payload as compact JSON text              |
//! | `timestamp_ms` | decimal string, only if the client sent one |
//! | `partition_key`| only if the client sent one               |

use openstream_log::{Fields, LogEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StreamError};
use crate::validate;

pub const EVENT_TYPE: &str = "event_type";
pub const PAYLOAD_JSON: &str = "payload_json";
pub const TIMESTAMP_MS: &str = "timestamp_ms";
pub const PARTITION_KEY: &str = "partition_key";

/// Event submitted by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIn {
    pub event_type: String,
    #[serde(default)]
    pub partition_key: Option<String>,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl EventIn {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            partition_key: None,
            payload: Map::new(),
            timestamp_ms: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Routing key; absent keys route as the empty string.
    pub fn routing_key(&self) -> &str {
        self.partition_key.as_deref().unwrap_or("")
    }

    pub fn validate(&self) -> Result<()> {
        validate::text(EVENT_TYPE, &self.event_type, 1, validate::MAX_NAME_LEN)?;
        if let Some(key) = &self.partition_key {
            validate::text(PARTITION_KEY, key, 0, validate::MAX_NAME_LEN)?;
        }
        Ok(())
    }

    /// Persisted fields, plus the byte size of the serialized payload.
    pub fn to_fields(&self) -> Result<(Fields, usize)> {
        let payload = serde_json::to_string(&self.payload)
            .map_err(|e| StreamError::validation(format!("payload is not serializable: {e}")))?;
        let size = payload.len();

        let mut fields = Fields::new();
        fields.insert(EVENT_TYPE.to_string(), self.event_type.clone());
        fields.insert(PAYLOAD_JSON.to_string(), payload);
        if let Some(ts) = self.timestamp_ms {
            fields.insert(TIMESTAMP_MS.to_string(), ts.to_string());
        }
        if let Some(key) = &self.partition_key {
            fields.insert(PARTITION_KEY.to_string(), key.clone());
        }
        Ok((fields, size))
    }
}

/// Where one ingested event landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedEvent {
    pub partition: u32,
    pub redis_id: String,
}

/// Event delivered to a consumer by read or claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEvent {
    pub partition: u32,
    pub redis_id: String,
    pub event_type: Option<String>,
    pub payload_json: Option<String>,
    pub timestamp_ms: Option<i64>,
    pub partition_key: Option<String>,
}

impl ReadEvent {
    /// Decode a stored entry. Missing fields stay `None`.
    pub fn from_entry(partition: u32, entry: LogEntry) -> Self {
        let LogEntry { id, mut fields } = entry;
        Self {
            partition,
            redis_id: id,
            event_type: fields.remove(EVENT_TYPE),
            payload_json: fields.remove(PAYLOAD_JSON),
            timestamp_ms: fields.get(TIMESTAMP_MS).and_then(|v| v.parse().ok()),
            partition_key: fields.remove(PARTITION_KEY),
        }
    }

    /// Parse `payload_json` back into a JSON value.
    pub fn payload(&self) -> Option<Value> {
        self.payload_json
            .as_deref()
            .and_then(|p| serde_json::from_str(p).ok())
    }
}
