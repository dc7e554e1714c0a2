//! Configuration for the coordination layer.

use serde::{Deserialize, Serialize};

/// Stream-level settings shared by every topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Partition count used for topics that have no recorded metadata yet.
    #[serde(default = "default_partitions")]
    pub partitions_default: u32,

    /// Reject appends to a partition at or above this length (0 disables the check).
    #[serde(default = "default_max_stream_len")]
    pub backpressure_max_stream_len: u64,

    /// Prefix for every engine key this layer writes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_partitions() -> u32 {
    8
}

fn default_max_stream_len() -> u64 {
    200_000
}

fn default_key_prefix() -> String {
    "os".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            partitions_default: default_partitions(),
            backpressure_max_stream_len: default_max_stream_len(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl StreamConfig {
    #[must_use]
    pub fn with_partitions_default(mut self, partitions: u32) -> Self {
        self.partitions_default = partitions.max(1);
        self
    }

    #[must_use]
    pub fn with_max_stream_len(mut self, max: u64) -> Self {
        self.backpressure_max_stream_len = max;
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}
