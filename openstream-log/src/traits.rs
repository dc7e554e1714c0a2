//! Core traits for log engine operations.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field set persisted with one entry.
pub type Fields = BTreeMap<String, String>;

/// One entry read back from a partition log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Engine-assigned id (`ms-seq`).
    pub id: String,
    /// Persisted fields.
    pub fields: Fields,
}

/// Entries returned for one log by a group read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch {
    /// Key of the log the entries came from.
    pub log: String,
    /// Entries in id order.
    pub entries: Vec<LogEntry>,
}

/// Result of one auto-claim call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoClaimed {
    /// Cursor to pass as `start` on the next call; `0-0` once the scan is complete.
    pub next_cursor: String,
    /// Entries now owned by the claiming consumer.
    pub entries: Vec<LogEntry>,
}

/// Consumer group bookkeeping for one log, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Group name.
    pub name: String,
    /// Number of consumers known to the group.
    pub consumers: u64,
    /// Number of delivered-but-unacknowledged entries.
    pub pending: u64,
    /// Id of the last entry delivered to the group.
    pub last_delivered_id: String,
}

/// The append-only log engine this layer coordinates.
///
/// All cross-client coordination (pending ownership, cursor advancement,
/// first-writer-wins metadata) happens atomically inside the engine.
#[async_trait]
pub trait LogEngine: Send + Sync {
    /// Append an entry to a log, creating the log if needed. Returns the assigned id.
    async fn append(&self, log: &str, fields: &Fields) -> crate::Result<String>;

    /// Number of entries in a log (0 if it does not exist).
    async fn len(&self, log: &str) -> crate::Result<u64>;

    /// Read entries never delivered to `group` from each log, at most `count` per log.
    ///
    /// Waits up to `block` when nothing is immediately available. Delivered
    /// entries join the group's pending set, owned by `consumer`.
    async fn read_group(
        &self,
        group: &str,
        consumer: &str,
        logs: &[String],
        count: usize,
        block: Option<Duration>,
    ) -> crate::Result<Vec<LogBatch>>;

    /// Remove ids from the group's pending set. Returns how many were actually removed.
    async fn ack(&self, log: &str, group: &str, ids: &[String]) -> crate::Result<u64>;

    /// Reassign pending entries idle for at least `min_idle` to `consumer`.
    async fn auto_claim(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        start: &str,
        count: usize,
    ) -> crate::Result<AutoClaimed>;

    /// Create a consumer group positioned at `start` (`$` or an id).
    async fn create_group(
        &self,
        log: &str,
        group: &str,
        start: &str,
        create_log: bool,
    ) -> crate::Result<()>;

    /// Move an existing group's cursor to `start` (`$` or an id).
    async fn set_group_cursor(&self, log: &str, group: &str, start: &str) -> crate::Result<()>;

    /// Set a metadata field only if it is absent. Returns true if this call set it.
    async fn set_meta_if_absent(&self, key: &str, field: &str, value: &str)
    -> crate::Result<bool>;

    /// Read a metadata field.
    async fn get_meta(&self, key: &str, field: &str) -> crate::Result<Option<String>>;

    /// Add a member to a set.
    async fn add_to_set(&self, key: &str, member: &str) -> crate::Result<()>;

    /// All members of a set.
    async fn set_members(&self, key: &str) -> crate::Result<Vec<String>>;

    /// Groups registered on a log (empty if the log does not exist).
    async fn group_info(&self, log: &str) -> crate::Result<Vec<GroupInfo>>;
}
