//! openstream-core: partitioned ingestion and consumer-group coordination
//!
//! This crate sits between an HTTP surface and an append-only log engine
//! (see `openstream-log`). It owns no durable state; every decision that
//! must hold across clients is delegated to atomic engine primitives.
//!
//! - **Routing** - [`router::partition_for`] maps `(topic, key)` to a partition
//! - **Registry** - [`TopicRegistry`] records partition counts, first writer wins
//! - **Ingestion** - [`StreamService::ingest`] appends batches with backpressure
//! - **Consumer groups** - [`StreamService::read`], [`StreamService::ack`] and
//!   [`StreamService::claim`] implement at-least-once delivery
//! - **Lifecycle** - [`StreamService::create_group`] and [`StreamService::reset_group`]
//! - **Auth** - [`TokenService`] and [`Principal::can`] for role checks
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use openstream_core::{EventIn, IngestRequest, StreamConfig, StreamService};
//! use openstream_log::InMemoryLogEngine;
//!
//! async fn example() -> openstream_core::Result<()> {
//!     let service = StreamService::new(Arc::new(InMemoryLogEngine::default()), StreamConfig::default());
//!     let request = IngestRequest::new(vec![EventIn::new("order.created").with_key("customer-42")]);
//!     let response = service.ingest("orders", &request).await?;
//!     println!("landed on partition {}", response.results[0].partition);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod consumer;
pub mod error;
pub mod event;
pub mod ingest;
pub mod keyspace;
pub mod lifecycle;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod service;
pub mod stats;
pub mod validate;

// Re-export key types for convenience
pub use auth::{AuthConfig, AuthError, Operation, Principal, Role, TokenClaims, TokenService};
pub use config::StreamConfig;
pub use consumer::{
    AckItem, AckRequest, AckResponse, ClaimRequest, ClaimResponse, PartitionCursor, ReadRequest,
    ReadResponse,
};
pub use error::{LogError, Result, StreamError};
pub use event::{EventIn, IngestedEvent, ReadEvent};
pub use ingest::{IngestRequest, IngestResponse};
pub use keyspace::Keyspace;
pub use lifecycle::{GroupCreateRequest, GroupCreated, GroupReset, GroupResetRequest};
pub use registry::TopicRegistry;
pub use router::partition_for;
pub use service::StreamService;
pub use stats::{PartitionStats, Summary, TopicDescription, TopicStats};
