//! Engine key layout.
//!
//! ```text
//! {prefix}:topics                       set of topic names
//! {prefix}:topic_meta:{topic}           hash, field `partitions`
//! {prefix}:stream:{topic}:{partition}   one log per partition
//! ```

/// Metadata field holding a topic's partition count.
pub const PARTITIONS_FIELD: &str = "partitions";

/// Derives every key the coordination layer reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new("os")
    }
}

impl Keyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Set of all known topic names.
    pub fn topics(&self) -> String {
        format!("{}:topics", self.prefix)
    }

    /// Metadata hash for one topic.
    pub fn topic_meta(&self, topic: &str) -> String {
        format!("{}:topic_meta:{topic}", self.prefix)
    }

    /// Log backing one partition.
    pub fn partition_log(&self, topic: &str, partition: u32) -> String {
        format!("{}:stream:{topic}:{partition}", self.prefix)
    }

    /// Partition index encoded in a log key: the last `:` segment, or 0.
    pub fn partition_of(log: &str) -> u32 {
        log.rsplit(':')
            .next()
            .and_then(|segment| segment.parse().ok())
            .unwrap_or(0)
    }
}
