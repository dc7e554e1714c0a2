//! In-memory LogEngine implementation for testing.
//!
//! Emulates the Redis stream semantics the coordination layer relies on:
//! time-ordered entry ids, per-group delivery cursors, pending-entry lists
//! with owner and idle tracking, auto-claim cursors and blocking reads.
//! Nothing is persisted.
//!
//! Idle time is measured with [`tokio::time::Instant`], so tests can pause
//! and advance the clock.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::entry_id::{EntryId, StartPosition};
use crate::error::{Error, Result};
use crate::traits::{AutoClaimed, Fields, GroupInfo, LogBatch, LogEngine, LogEntry};

/// One delivered-but-unacknowledged entry.
#[derive(Debug, Clone)]
struct PendingEntry {
    consumer: String,
    delivered_at: Instant,
    delivery_count: u64,
}

#[derive(Debug)]
struct GroupState {
    last_delivered: EntryId,
    pending: BTreeMap<EntryId, PendingEntry>,
    consumers: BTreeSet<String>,
}

impl GroupState {
    fn at(last_delivered: EntryId) -> Self {
        Self {
            last_delivered,
            pending: BTreeMap::new(),
            consumers: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: BTreeMap<EntryId, Fields>,
    last_id: EntryId,
    groups: HashMap<String, GroupState>,
}

impl LogState {
    fn resolve(&self, position: StartPosition) -> EntryId {
        match position {
            StartPosition::Latest => self.last_id,
            StartPosition::After(id) => id,
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    logs: HashMap<String, LogState>,
    meta: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    failing: HashSet<String>,
}

impl EngineState {
    fn check(&self, log: &str) -> Result<()> {
        if self.failing.contains(log) {
            return Err(Error::Unavailable(format!("injected failure on {log}")));
        }
        Ok(())
    }
}

fn no_group(log: &str, group: &str) -> Error {
    Error::NoGroup {
        log: log.to_string(),
        group: group.to_string(),
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// In-memory implementation of LogEngine for testing and local development.
#[derive(Default)]
pub struct InMemoryLogEngine {
    state: Mutex<EngineState>,
    appended: Notify,
}

impl InMemoryLogEngine {
    /// Create a new, empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching the key `log` (a log, hash or set) fail until [`heal_log`](Self::heal_log).
    pub async fn fail_log(&self, log: impl Into<String>) {
        self.state.lock().await.failing.insert(log.into());
    }

    /// Undo [`fail_log`](Self::fail_log).
    pub async fn heal_log(&self, log: &str) {
        self.state.lock().await.failing.remove(log);
    }

    /// Current owner of a pending entry, if it is pending.
    pub async fn pending_owner(&self, log: &str, group: &str, id: &str) -> Option<String> {
        let id: EntryId = id.parse().ok()?;
        let state = self.state.lock().await;
        state
            .logs
            .get(log)?
            .groups
            .get(group)?
            .pending
            .get(&id)
            .map(|p| p.consumer.clone())
    }

    /// How many times a pending entry has been delivered (read or claimed).
    pub async fn delivery_count(&self, log: &str, group: &str, id: &str) -> Option<u64> {
        let id: EntryId = id.parse().ok()?;
        let state = self.state.lock().await;
        state
            .logs
            .get(log)?
            .groups
            .get(group)?
            .pending
            .get(&id)
            .map(|p| p.delivery_count)
    }

    /// Number of pending entries for a group on a log.
    pub async fn pending_count(&self, log: &str, group: &str) -> usize {
        let state = self.state.lock().await;
        state
            .logs
            .get(log)
            .and_then(|l| l.groups.get(group))
            .map_or(0, |g| g.pending.len())
    }

    /// One non-blocking pass of a group read.
    async fn try_read_group(
        &self,
        group: &str,
        consumer: &str,
        logs: &[String],
        count: usize,
    ) -> Result<Vec<LogBatch>> {
        let mut state = self.state.lock().await;
        for log in logs {
            state.check(log)?;
            let has_group = state
                .logs
                .get(log)
                .is_some_and(|l| l.groups.contains_key(group));
            if !has_group {
                return Err(no_group(log, group));
            }
        }

        let now = Instant::now();
        let mut batches = Vec::new();
        for log in logs {
            let Some(LogState { entries, groups, .. }) = state.logs.get_mut(log) else {
                continue;
            };
            let Some(group_state) = groups.get_mut(group) else {
                continue;
            };
            group_state.consumers.insert(consumer.to_string());

            let delivered: Vec<(EntryId, Fields)> = entries
                .range((Bound::Excluded(group_state.last_delivered), Bound::Unbounded))
                .take(count)
                .map(|(id, fields)| (*id, fields.clone()))
                .collect();
            let Some((last, _)) = delivered.last() else {
                continue;
            };

            group_state.last_delivered = *last;
            for (id, _) in &delivered {
                group_state.pending.insert(
                    *id,
                    PendingEntry {
                        consumer: consumer.to_string(),
                        delivered_at: now,
                        delivery_count: 1,
                    },
                );
            }
            batches.push(LogBatch {
                log: log.clone(),
                entries: delivered
                    .into_iter()
                    .map(|(id, fields)| LogEntry {
                        id: id.to_string(),
                        fields,
                    })
                    .collect(),
            });
        }
        Ok(batches)
    }
}

#[async_trait]
impl LogEngine for InMemoryLogEngine {
    async fn append(&self, log: &str, fields: &Fields) -> Result<String> {
        let id = {
            let mut state = self.state.lock().await;
            state.check(log)?;
            let log_state = state.logs.entry(log.to_string()).or_default();

            let now = now_millis();
            let id = if now > log_state.last_id.ms {
                EntryId::new(now, 0)
            } else {
                log_state.last_id.successor()
            };
            log_state.entries.insert(id, fields.clone());
            log_state.last_id = id;
            id
        };
        self.appended.notify_waiters();
        Ok(id.to_string())
    }

    async fn len(&self, log: &str) -> Result<u64> {
        let state = self.state.lock().await;
        state.check(log)?;
        Ok(state.logs.get(log).map_or(0, |l| l.entries.len() as u64))
    }

    async fn read_group(
        &self,
        group: &str,
        consumer: &str,
        logs: &[String],
        count: usize,
        block: Option<Duration>,
    ) -> Result<Vec<LogBatch>> {
        let deadline = block.map(|b| Instant::now() + b);
        loop {
            // Register interest before looking so an append between the
            // check and the wait is not missed.
            let notified = self.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batches = self.try_read_group(group, consumer, logs, count).await?;
            if !batches.is_empty() {
                return Ok(batches);
            }
            let Some(deadline) = deadline else {
                return Ok(batches);
            };
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn ack(&self, log: &str, group: &str, ids: &[String]) -> Result<u64> {
        let parsed = ids
            .iter()
            .map(|id| id.parse::<EntryId>())
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.lock().await;
        state.check(log)?;
        let Some(group_state) = state
            .logs
            .get_mut(log)
            .and_then(|l| l.groups.get_mut(group))
        else {
            return Ok(0);
        };

        let removed = parsed
            .iter()
            .filter(|id| group_state.pending.remove(id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn auto_claim(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        start: &str,
        count: usize,
    ) -> Result<AutoClaimed> {
        let start: EntryId = start.parse()?;

        let mut state = self.state.lock().await;
        state.check(log)?;
        let Some(LogState { entries, groups, .. }) = state.logs.get_mut(log) else {
            return Err(no_group(log, group));
        };
        let group_state = groups.get_mut(group).ok_or_else(|| no_group(log, group))?;
        group_state.consumers.insert(consumer.to_string());

        let now = Instant::now();
        let candidates: Vec<EntryId> = group_state.pending.range(start..).map(|(id, _)| *id).collect();
        let mut attempts = count.saturating_mul(10);
        let mut next_cursor = EntryId::ZERO;
        let mut claimed = Vec::new();

        for id in candidates {
            if claimed.len() == count || attempts == 0 {
                next_cursor = id;
                break;
            }
            attempts -= 1;

            let Some(fields) = entries.get(&id) else {
                group_state.pending.remove(&id);
                continue;
            };
            let Some(pending) = group_state.pending.get_mut(&id) else {
                continue;
            };
            if now.saturating_duration_since(pending.delivered_at) < min_idle {
                continue;
            }
            pending.consumer = consumer.to_string();
            pending.delivered_at = now;
            pending.delivery_count += 1;
            claimed.push(LogEntry {
                id: id.to_string(),
                fields: fields.clone(),
            });
        }

        Ok(AutoClaimed {
            next_cursor: next_cursor.to_string(),
            entries: claimed,
        })
    }

    async fn create_group(
        &self,
        log: &str,
        group: &str,
        start: &str,
        create_log: bool,
    ) -> Result<()> {
        let position = StartPosition::parse(start)?;

        let mut state = self.state.lock().await;
        state.check(log)?;
        if !state.logs.contains_key(log) {
            if !create_log {
                return Err(Error::NoSuchLog(log.to_string()));
            }
            state.logs.insert(log.to_string(), LogState::default());
        }
        let log_state = state
            .logs
            .get_mut(log)
            .ok_or_else(|| Error::NoSuchLog(log.to_string()))?;
        if log_state.groups.contains_key(group) {
            return Err(Error::GroupExists {
                log: log.to_string(),
                group: group.to_string(),
            });
        }
        let cursor = log_state.resolve(position);
        log_state.groups.insert(group.to_string(), GroupState::at(cursor));
        Ok(())
    }

    async fn set_group_cursor(&self, log: &str, group: &str, start: &str) -> Result<()> {
        let position = StartPosition::parse(start)?;

        let mut state = self.state.lock().await;
        state.check(log)?;
        let log_state = state
            .logs
            .get_mut(log)
            .ok_or_else(|| Error::NoSuchLog(log.to_string()))?;
        let cursor = log_state.resolve(position);
        let group_state = log_state
            .groups
            .get_mut(group)
            .ok_or_else(|| no_group(log, group))?;
        group_state.last_delivered = cursor;
        Ok(())
    }

    async fn set_meta_if_absent(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.check(key)?;
        let hash = state.meta.entry(key.to_string()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    async fn get_meta(&self, key: &str, field: &str) -> Result<Option<String>> {
        let state = self.state.lock().await;
        state.check(key)?;
        Ok(state.meta.get(key).and_then(|h| h.get(field)).cloned())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check(key)?;
        state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        state.check(key)?;
        Ok(state
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn group_info(&self, log: &str) -> Result<Vec<GroupInfo>> {
        let state = self.state.lock().await;
        state.check(log)?;
        let Some(log_state) = state.logs.get(log) else {
            return Ok(Vec::new());
        };
        let mut groups: Vec<GroupInfo> = log_state
            .groups
            .iter()
            .map(|(name, g)| GroupInfo {
                name: name.clone(),
                consumers: g.consumers.len() as u64,
                pending: g.pending.len() as u64,
                last_delivered_id: g.last_delivered.to_string(),
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }
}
