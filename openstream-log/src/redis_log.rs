//! Redis-backed LogEngine implementation.
//!
//! Each partition log is a Redis stream; consumer groups, pending-entry lists
//! and idle tracking are Redis' own. Topic metadata lives in hashes and sets.
//!
//! # Connections
//!
//! A single multiplexed [`ConnectionManager`] is created lazily on first use
//! and shared by every call. It reconnects on its own after failures.
//!
//! Blocking reads (`XREADGROUP ... BLOCK`) would stall every other command
//! pipelined on the shared connection, so they run on dedicated connections
//! from a small bounded pool instead. If the caller drops the read future
//! (client disconnect), the connection in use is dropped with it and its
//! pool slot is released.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::{Cmd, Value};
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::entry_id::UNDELIVERED;
use crate::error::{Error, Result};
use crate::traits::{AutoClaimed, Fields, GroupInfo, LogBatch, LogEngine, LogEntry};

/// Redis-backed implementation of LogEngine.
pub struct RedisLogEngine {
    config: EngineConfig,

    /// Client used to open connections.
    client: redis::Client,

    /// Shared multiplexed connection, created on first use.
    shared: OnceCell<ConnectionManager>,

    /// Bounds the number of connections parked in blocking reads.
    blocking_slots: Semaphore,

    /// Idle dedicated connections ready for the next blocking read.
    blocking_idle: Mutex<Vec<MultiplexedConnection>>,
}

impl RedisLogEngine {
    /// Create a new engine. No connection is opened until the first call.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            blocking_slots: Semaphore::new(config.blocking_pool_size.max(1)),
            blocking_idle: Mutex::new(Vec::new()),
            shared: OnceCell::new(),
            client,
            config,
        })
    }

    /// The configuration this engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check that Redis answers.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .shared
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                info!(url = %self.config.redis_url, "Connected to Redis log engine");
                Ok::<_, Error>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &Cmd) -> Result<T> {
        let mut conn = self.connection().await?;
        Ok(cmd.query_async(&mut conn).await?)
    }

    /// Run a blocking command on a dedicated pooled connection.
    async fn query_blocking(&self, cmd: &Cmd) -> Result<Value> {
        let _slot = self
            .blocking_slots
            .acquire()
            .await
            .map_err(|_| Error::Unavailable("blocking connection pool closed".to_string()))?;

        let pooled = self.blocking_idle.lock().await.pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => {
                debug!("Opening dedicated connection for blocking read");
                self.client.get_multiplexed_async_connection().await?
            }
        };

        let reply: Value = cmd.query_async(&mut conn).await?;
        self.blocking_idle.lock().await.push(conn);
        Ok(reply)
    }
}

#[async_trait]
impl LogEngine for RedisLogEngine {
    async fn append(&self, log: &str, fields: &Fields) -> Result<String> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(log).arg("*");
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        self.query(&cmd).await
    }

    async fn len(&self, log: &str) -> Result<u64> {
        self.query(redis::cmd("XLEN").arg(log)).await
    }

    async fn read_group(
        &self,
        group: &str,
        consumer: &str,
        logs: &[String],
        count: usize,
        block: Option<Duration>,
    ) -> Result<Vec<LogBatch>> {
        if logs.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP").arg(group).arg(consumer).arg("COUNT").arg(count);
        if let Some(block) = block {
            cmd.arg("BLOCK").arg(block.as_millis() as u64);
        }
        cmd.arg("STREAMS").arg(logs);
        for _ in logs {
            cmd.arg(UNDELIVERED);
        }

        let reply = match block {
            Some(_) => self.query_blocking(&cmd).await?,
            None => self.query::<Value>(&cmd).await?,
        };
        parse_read_reply(&reply)
    }

    async fn ack(&self, log: &str, group: &str, ids: &[String]) -> Result<u64> {
        self.query(redis::cmd("XACK").arg(log).arg(group).arg(ids))
            .await
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
        let reply: Value = self
            .query(
                redis::cmd("XAUTOCLAIM")
                    .arg(log)
                    .arg(group)
                    .arg(consumer)
                    .arg(min_idle.as_millis() as u64)
                    .arg(start)
                    .arg("COUNT")
                    .arg(count),
            )
            .await?;
        parse_auto_claim(&reply)
    }

    async fn create_group(
        &self,
        log: &str,
        group: &str,
        start: &str,
        create_log: bool,
    ) -> Result<()> {
        let mut cmd = redis::cmd("XGROUP");
        cmd.arg("CREATE").arg(log).arg(group).arg(start);
        if create_log {
            cmd.arg("MKSTREAM");
        }
        match self.query::<()>(&cmd).await {
            Err(e) if e.is_group_exists() => Err(Error::GroupExists {
                log: log.to_string(),
                group: group.to_string(),
            }),
            other => other,
        }
    }

    async fn set_group_cursor(&self, log: &str, group: &str, start: &str) -> Result<()> {
        self.query(redis::cmd("XGROUP").arg("SETID").arg(log).arg(group).arg(start))
            .await
    }

    async fn set_meta_if_absent(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        self.query(redis::cmd("HSETNX").arg(key).arg(field).arg(value))
            .await
    }

    async fn get_meta(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.query(redis::cmd("HGET").arg(key).arg(field)).await
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<()> {
        self.query(redis::cmd("SADD").arg(key).arg(member)).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.query(redis::cmd("SMEMBERS").arg(key)).await
    }

    async fn group_info(&self, log: &str) -> Result<Vec<GroupInfo>> {
        match self
            .query::<Value>(redis::cmd("XINFO").arg("GROUPS").arg(log))
            .await
        {
            Ok(reply) => match reply {
                Value::Array(groups) | Value::Set(groups) => {
                    groups.iter().map(parse_group_info).collect()
                }
                Value::Nil => Ok(Vec::new()),
                other => Err(unexpected("XINFO GROUPS", &other)),
            },
            // The stream has not been created yet.
            Err(e) if e.to_string().to_lowercase().contains("no such key") => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

fn unexpected(what: &str, value: &Value) -> Error {
    Error::UnexpectedReply(format!("{what}: {value:?}"))
}

fn string(value: &Value) -> Result<String> {
    Ok(redis::from_redis_value(value)?)
}

/// Key/value pairs from a flat RESP2 array or a RESP3 map.
fn pairs(value: &Value) -> Result<Vec<(&Value, &Value)>> {
    match value {
        Value::Array(items) if items.len() % 2 == 0 => {
            Ok(items.chunks(2).map(|kv| (&kv[0], &kv[1])).collect())
        }
        Value::Map(entries) => Ok(entries.iter().map(|(k, v)| (k, v)).collect()),
        other => Err(unexpected("field list", other)),
    }
}

fn parse_fields(value: &Value) -> Result<Fields> {
    pairs(value)?
        .into_iter()
        .map(|(k, v)| Ok((string(k)?, string(v)?)))
        .collect()
}

/// Entries as `[[id, [k, v, ...]], ...]`. Nil slots (entries deleted
/// while pending) are skipped.
fn parse_entries(value: &Value) -> Result<Vec<LogEntry>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Nil => return Ok(Vec::new()),
        other => return Err(unexpected("entry list", other)),
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(parts) if parts.len() == 2 => {
                if matches!(parts[1], Value::Nil) {
                    continue;
                }
                entries.push(LogEntry {
                    id: string(&parts[0])?,
                    fields: parse_fields(&parts[1])?,
                });
            }
            Value::Nil => continue,
            other => return Err(unexpected("entry", other)),
        }
    }
    Ok(entries)
}

fn parse_read_reply(value: &Value) -> Result<Vec<LogBatch>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Array(streams) => streams
            .iter()
            .map(|stream| match stream {
                Value::Array(parts) if parts.len() == 2 => Ok(LogBatch {
                    log: string(&parts[0])?,
                    entries: parse_entries(&parts[1])?,
                }),
                other => Err(unexpected("XREADGROUP stream", other)),
            })
            .collect(),
        Value::Map(streams) => streams
            .iter()
            .map(|(log, entries)| {
                Ok(LogBatch {
                    log: string(log)?,
                    entries: parse_entries(entries)?,
                })
            })
            .collect(),
        other => Err(unexpected("XREADGROUP", other)),
    }
}

fn parse_auto_claim(value: &Value) -> Result<AutoClaimed> {
    match value {
        // Redis 7 appends a third element listing deleted ids; it is not needed here.
        Value::Array(parts) if parts.len() >= 2 => Ok(AutoClaimed {
            next_cursor: string(&parts[0])?,
            entries: parse_entries(&parts[1])?,
        }),
        other => Err(unexpected("XAUTOCLAIM", other)),
    }
}

fn parse_group_info(value: &Value) -> Result<GroupInfo> {
    let mut info = GroupInfo {
        name: String::new(),
        consumers: 0,
        pending: 0,
        last_delivered_id: String::new(),
    };
    for (key, value) in pairs(value)? {
        match string(key)?.as_str() {
            "name" => info.name = string(value)?,
            "consumers" => info.consumers = redis::from_redis_value(value)?,
            "pending" => info.pending = redis::from_redis_value(value)?,
            "last-delivered-id" => info.last_delivered_id = string(value)?,
            _ => {}
        }
    }
    Ok(info)
}
