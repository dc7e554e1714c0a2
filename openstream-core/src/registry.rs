//! Topic registry: which topics exist and how many partitions each has.
//!
//! Partition counts are written with a set-if-absent primitive, so the
//! first writer wins and later requests with a different count never
//! overwrite it.

use std::sync::Arc;

use openstream_log::LogEngine;
use tracing::{debug, warn};

use crate::error::Result;
use crate::keyspace::{Keyspace, PARTITIONS_FIELD};

#[derive(Clone)]
pub struct TopicRegistry {
    engine: Arc<dyn LogEngine>,
    keys: Keyspace,
    default_partitions: u32,
}

impl TopicRegistry {
    pub fn new(engine: Arc<dyn LogEngine>, keys: Keyspace, default_partitions: u32) -> Self {
        Self {
            engine,
            keys,
            default_partitions: default_partitions.max(1),
        }
    }

    /// Register `topic` and record `partitions` unless a count is already recorded.
    pub async fn ensure_topic(&self, topic: &str, partitions: u32) -> Result<()> {
        self.engine.add_to_set(&self.keys.topics(), topic).await?;
        let recorded = self
            .engine
            .set_meta_if_absent(
                &self.keys.topic_meta(topic),
                PARTITIONS_FIELD,
                &partitions.to_string(),
            )
            .await?;
        if recorded {
            debug!(topic, partitions, "Recorded topic partition count");
        }
        Ok(())
    }

    /// Recorded partition count, or the default for unknown topics.
    pub async fn partition_count(&self, topic: &str) -> Result<u32> {
        let raw = self
            .engine
            .get_meta(&self.keys.topic_meta(topic), PARTITIONS_FIELD)
            .await?;
        Ok(match raw {
            None => self.default_partitions,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(topic, value = %raw, "Ignoring unusable recorded partition count");
                    self.default_partitions
                }
            },
        })
    }

    /// All registered topics, sorted by name.
    pub async fn topics(&self) -> Result<Vec<String>> {
        let mut topics = self.engine.set_members(&self.keys.topics()).await?;
        topics.sort();
        Ok(topics)
    }

    pub fn default_partitions(&self) -> u32 {
        self.default_partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openstream_log::InMemoryLogEngine;

    fn registry() -> (Arc<InMemoryLogEngine>, TopicRegistry) {
        let engine = Arc::new(InMemoryLogEngine::default());
        let registry = TopicRegistry::new(engine.clone(), Keyspace::default(), 8);
        (engine, registry)
    }

    #[tokio::test]
    async fn unknown_topic_uses_default() {
        let (_, registry) = registry();
        assert_eq!(registry.partition_count("orders").await.unwrap(), 8);
        assert!(registry.topics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_writer_wins() {
        let (_, registry) = registry();
        registry.ensure_topic("orders", 4).await.unwrap();
        registry.ensure_topic("orders", 16).await.unwrap();

        assert_eq!(registry.partition_count("orders").await.unwrap(), 4);
        assert_eq!(registry.topics().await.unwrap(), vec!["orders"]);
    }

    #[tokio::test]
    async fn concurrent_registration_settles_on_one_count() {
        let (_, registry) = registry();
        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.ensure_topic("clicks", n).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let count = registry.partition_count("clicks").await.unwrap();
        assert!((1..=8).contains(&count));
        registry.ensure_topic("clicks", 99).await.unwrap();
        assert_eq!(registry.partition_count("clicks").await.unwrap(), count);
    }

    #[tokio::test]
    async fn topics_are_sorted() {
        let (_, registry) = registry();
        for topic in ["zeta", "alpha", "mid"] {
            registry.ensure_topic(topic, 1).await.unwrap();
        }
        assert_eq!(registry.topics().await.unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn garbage_count_falls_back_to_default() {
        let (engine, registry) = registry();
        engine
            .set_meta_if_absent("os:topic_meta:weird", PARTITIONS_FIELD, "zero")
            .await
            .unwrap();
        assert_eq!(registry.partition_count("weird").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let (engine, registry) = registry();
        engine.fail_log("os:topics").await;
        assert!(registry.ensure_topic("orders", 4).await.is_err());
    }
}
