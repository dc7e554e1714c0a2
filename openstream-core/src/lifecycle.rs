//! Group lifecycle: create a group on every partition, or move its cursor.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StreamError};
use crate::service::StreamService;
use crate::validate;

fn default_create_start() -> String {
    openstream_log::LATEST.to_string()
}

fn default_reset_start() -> String {
    "0-0".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreateRequest {
    pub group: String,
    /// `$` delivers only entries appended after creation.
    #[serde(default = "default_create_start")]
    pub start_id: String,
    #[serde(default)]
    pub partitions: Option<u32>,
}

impl GroupCreateRequest {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            start_id: default_create_start(),
            partitions: None,
        }
    }

    pub fn with_start_id(mut self, start_id: impl Into<String>) -> Self {
        self.start_id = start_id.into();
        self
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate::name("group", &self.group)?;
        validate::start_position("start_id", &self.start_id)?;
        if let Some(p) = self.partitions {
            validate::range("partitions", p, 1, validate::MAX_PARTITIONS)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreated {
    pub topic: String,
    pub group: String,
    pub partitions: u32,
    /// Partitions where the group did not exist before this call.
    pub created: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupResetRequest {
    /// `0-0` replays the whole log; `$` skips to new entries.
    #[serde(default = "default_reset_start")]
    pub start_id: String,
}

impl Default for GroupResetRequest {
    fn default() -> Self {
        Self {
            start_id: default_reset_start(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReset {
    pub topic: String,
    pub group: String,
    pub start_id: String,
    pub updated_partitions: u32,
}

impl StreamService {
    /// Create `group` on every partition of `topic`, creating missing logs.
    ///
    /// A partition where creation fails (usually because the group already
    /// exists) counts as already satisfied.
    pub async fn create_group(&self, topic: &str, request: &GroupCreateRequest) -> Result<GroupCreated> {
        validate::name("topic", topic)?;
        request.validate()?;

        let partitions = match request.partitions {
            Some(p) => p,
            None => self.registry.partition_count(topic).await?,
        };
        self.registry.ensure_topic(topic, partitions).await?;

        let mut created = 0;
        for partition in 0..partitions {
            let log = self.keys.partition_log(topic, partition);
            match self
                .engine
                .create_group(&log, &request.group, &request.start_id, true)
                .await
            {
                Ok(()) => created += 1,
                Err(e) if e.is_group_exists() => {
                    debug!(topic, group = %request.group, partition, "Group already exists");
                }
                Err(e) => {
                    warn!(topic, group = %request.group, partition, error = %e, "Group creation failed; treating as existing");
                }
            }
        }

        info!(topic, group = %request.group, partitions, created, "Created consumer group");
        Ok(GroupCreated {
            topic: topic.to_string(),
            group: request.group.clone(),
            partitions,
            created,
        })
    }

    /// Move `group`'s cursor on every partition to `start_id`.
    ///
    /// Partitions where the group is missing are skipped; if none were
    /// updated the group is reported as not found.
    pub async fn reset_group(&self, topic: &str, group: &str, request: &GroupResetRequest) -> Result<GroupReset> {
        validate::name("topic", topic)?;
        validate::name("group", group)?;
        validate::start_position("start_id", &request.start_id)?;

        let partitions = self.registry.partition_count(topic).await?;
        let mut updated = 0;
        for partition in 0..partitions {
            let log = self.keys.partition_log(topic, partition);
            match self.engine.set_group_cursor(&log, group, &request.start_id).await {
                Ok(()) => updated += 1,
                Err(e) if e.is_missing_group() => {
                    debug!(topic, group, partition, "Group missing on partition");
                }
                Err(e) => {
                    warn!(topic, group, partition, error = %e, "Skipping partition during reset");
                }
            }
        }

        if updated == 0 {
            return Err(StreamError::NotFound(format!(
                "group '{group}' not found on any partition of '{topic}'"
            )));
        }

        info!(topic, group, start_id = %request.start_id, updated, "Reset consumer group");
        Ok(GroupReset {
            topic: topic.to_string(),
            group: group.to_string(),
            start_id: request.start_id.clone(),
            updated_partitions: updated,
        })
    }
}
