//! Topic description and a diagnostic summary across all topics.

use openstream_log::GroupInfo;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::service::StreamService;
use crate::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescription {
    pub topic: String,
    pub partitions: u32,
    pub max_stream_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub partition: u32,
    /// Engine key of the partition log.
    pub stream: String,
    pub length: u64,
    pub groups: Vec<GroupInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: String,
    pub partitions: u32,
    pub partition_stats: Vec<PartitionStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub topics: Vec<TopicStats>,
}

impl StreamService {
    pub async fn describe_topic(&self, topic: &str) -> Result<TopicDescription> {
        validate::name("topic", topic)?;
        Ok(TopicDescription {
            topic: topic.to_string(),
            partitions: self.registry.partition_count(topic).await?,
            max_stream_len: self.config.backpressure_max_stream_len,
        })
    }

    /// Lengths and group bookkeeping for every partition of every topic,
    /// topics sorted by name. Meant for dashboards, not exhaustive.
    pub async fn summary(&self) -> Result<Summary> {
        let mut topics = Vec::new();
        for topic in self.registry.topics().await? {
            let partitions = self.registry.partition_count(&topic).await?;
            let mut partition_stats = Vec::with_capacity(partitions as usize);
            for partition in 0..partitions {
                let stream = self.keys.partition_log(&topic, partition);
                partition_stats.push(PartitionStats {
                    partition,
                    length: self.engine.len(&stream).await?,
                    groups: self.engine.group_info(&stream).await?,
                    stream,
                });
            }
            topics.push(TopicStats {
                topic,
                partitions,
                partition_stats,
            });
        }
        Ok(Summary { topics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::consumer::ReadRequest;
    use crate::event::EventIn;
    use crate::ingest::IngestRequest;
    use crate::lifecycle::GroupCreateRequest;
    use crate::service::test_support::{service, service_with};

    #[tokio::test]
    async fn describe_unknown_topic_uses_defaults() {
        let (_, service) = service_with(StreamConfig::default().with_max_stream_len(1000));
        let description = service.describe_topic("orders").await.unwrap();
        assert_eq!(
            description,
            TopicDescription {
                topic: "orders".to_string(),
                partitions: 8,
                max_stream_len: 1000,
            }
        );
    }

    #[tokio::test]
    async fn summary_reports_lengths_and_pending() {
        let (_, service) = service();
        service
            .create_group("orders", &GroupCreateRequest::new("billing").with_start_id("0-0").with_partitions(2))
            .await
            .unwrap();
        service
            .ingest("clicks", &IngestRequest::new(vec![EventIn::new("click")]).with_partitions(1))
            .await
            .unwrap();
        service
            .ingest(
                "orders",
                &IngestRequest::new(vec![EventIn::new("a"), EventIn::new("b")]),
            )
            .await
            .unwrap();
        service
            .read("orders", "billing", &ReadRequest::new("c").with_block_ms(0))
            .await
            .unwrap();

        let summary = service.summary().await.unwrap();
        let names: Vec<&str> = summary.topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["clicks", "orders"]);

        let orders = &summary.topics[1];
        assert_eq!(orders.partitions, 2);
        let p0 = &orders.partition_stats[0];
        assert_eq!(p0.stream, "os:stream:orders:0");
        assert_eq!(p0.length, 2);
        assert_eq!(p0.groups[0].name, "billing");
        assert_eq!(p0.groups[0].pending, 2);
        assert_eq!(orders.partition_stats[1].length, 0);
    }

    #[tokio::test]
    async fn empty_summary() {
        let (_, service) = service();
        assert!(service.summary().await.unwrap().topics.is_empty());
    }
}
