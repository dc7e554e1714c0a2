//! Entry point bundling the engine handle, keyspace and registry.
//!
//! The service holds no state of its own between requests; every durable
//! fact lives in the log engine. Cloning is cheap and clones share the
//! engine handle.

use std::sync::Arc;

use openstream_log::LogEngine;

use crate::config::StreamConfig;
use crate::keyspace::Keyspace;
use crate::registry::TopicRegistry;

/// Coordination layer over one log engine.
///
/// Operations are spread across modules by concern:
/// [`ingest`](crate::ingest), [`consumer`](crate::consumer),
/// [`lifecycle`](crate::lifecycle) and [`stats`](crate::stats).
#[derive(Clone)]
pub struct StreamService {
    pub(crate) engine: Arc<dyn LogEngine>,
    pub(crate) config: Arc<StreamConfig>,
    pub(crate) keys: Keyspace,
    pub(crate) registry: TopicRegistry,
}

impl StreamService {
    pub fn new(engine: Arc<dyn LogEngine>, config: StreamConfig) -> Self {
        let keys = Keyspace::new(config.key_prefix.clone());
        let registry = TopicRegistry::new(engine.clone(), keys.clone(), config.partitions_default);
        Self {
            engine,
            config: Arc::new(config),
            keys,
            registry,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keys
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<dyn LogEngine> {
        &self.engine
    }

    /// Partitions a request addresses: the explicit list, or all of them
    /// when the list is absent or empty.
    pub(crate) fn scope(requested: Option<&[u32]>, count: u32) -> Vec<u32> {
        match requested {
            Some(parts) if !parts.is_empty() => parts.to_vec(),
            _ => (0..count).collect(),
        }
    }

    pub(crate) fn logs_for(&self, topic: &str, partitions: &[u32]) -> Vec<String> {
        partitions
            .iter()
            .map(|&p| self.keys.partition_log(topic, p))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use openstream_log::InMemoryLogEngine;

    pub fn service_with(config: StreamConfig) -> (Arc<InMemoryLogEngine>, StreamService) {
        let engine = Arc::new(InMemoryLogEngine::default());
        let service = StreamService::new(engine.clone(), config);
        (engine, service)
    }

    pub fn service() -> (Arc<InMemoryLogEngine>, StreamService) {
        service_with(StreamConfig::default())
    }
}
