//! Partitioned append-only log engine boundary for OpenStream.
//!
//! This crate owns everything that touches the log engine: the
//! [`LogEngine`] trait the coordination layer is written against, a
//! Redis Streams implementation, and an in-memory implementation used by
//! tests and local development.
//!
//! # Key Types
//!
//! - [`LogEngine`] - Append, group read, ack, auto-claim and metadata operations
//! - [`RedisLogEngine`] - Redis Streams-backed implementation
//! - [`InMemoryLogEngine`] - In-process implementation with the same semantics
//! - [`EntryId`] - Parsed `ms-seq` entry identifier

pub mod config;
pub mod entry_id;
pub mod error;
pub mod memory;
pub mod redis_log;
pub mod traits;

// Re-exports
pub use config::EngineConfig;
pub use entry_id::{EntryId, LATEST, StartPosition, UNDELIVERED};
pub use error::{Error, Result};
pub use memory::InMemoryLogEngine;
pub use redis_log::RedisLogEngine;
pub use traits::{AutoClaimed, Fields, GroupInfo, LogBatch, LogEngine, LogEntry};
