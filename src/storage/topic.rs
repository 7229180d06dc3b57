//! Topic implementation for membroker storage
//!
//! A topic owns a fixed set of partitions and routes each appended record
//! to one of them by key hash. After every append it wakes the consumer
//! groups subscribed to it so parked consumption loops re-poll; it never
//! blocks on consumer progress.

use crate::config::{GroupSettings, TopicSettings};
use crate::consumer::group::ConsumerGroup;
use crate::storage::partition::Partition;
use crate::storage::record::{Record, RecordMetadata};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A named, partitioned record stream
pub struct Topic {
    /// Topic name
    name: String,

    /// Partitions, indexed by partition ID. Fixed at creation.
    partitions: Vec<Arc<Partition>>,

    /// Maximum records fetched per partition per poll, inherited by
    /// this topic's consumer groups
    poll_size: usize,

    /// Consumer groups subscribed to this topic, by group name
    groups: RwLock<HashMap<String, Arc<ConsumerGroup>>>,
}

impl Topic {
    pub(crate) fn new(name: &str, settings: &TopicSettings) -> Self {
        let partitions = (0..settings.partitions)
            .map(|id| Arc::new(Partition::new(name, id, settings.retention_capacity)))
            .collect();

        info!(
            topic = %name,
            partitions = settings.partitions,
            retention_capacity = settings.retention_capacity,
            "Topic created"
        );

        Self {
            name: name.to_string(),
            partitions,
            poll_size: settings.poll_size,
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Topic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of partitions
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Partition by ID
    pub fn partition(&self, id: i32) -> Option<&Arc<Partition>> {
        self.partitions.get(id as usize)
    }

    /// All partitions, ordered by ID
    pub fn partitions(&self) -> &[Arc<Partition>] {
        &self.partitions
    }

    /// Append a record, routed by key hash.
    ///
    /// Records without a key land on partition 0. Wakes every consumer
    /// group subscribed to this topic after the append; never blocks on
    /// consumers.
    pub fn append(&self, key: Option<Bytes>, value: Bytes) -> RecordMetadata {
        let index = partition_for_key(key.as_deref(), self.partitions.len());
        let meta = self.partitions[index].append(Record::new(key, value));

        debug!(
            topic = %self.name,
            partition = meta.partition,
            offset = meta.offset,
            bytes = meta.record.size(),
            "Record appended"
        );

        for group in self.groups.read().values() {
            group.wake();
        }

        meta
    }

    /// Get or create the consumer group with the given name.
    ///
    /// Settings are applied only when the group is created; concurrent
    /// callers observe the same instance.
    pub(crate) fn consumer_group(&self, name: &str, settings: GroupSettings) -> Arc<ConsumerGroup> {
        if let Some(group) = self.groups.read().get(name) {
            return group.clone();
        }

        let mut groups = self.groups.write();
        groups
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(group = %name, topic = %self.name, "Consumer group created");
                Arc::new(ConsumerGroup::new(
                    name,
                    &self.name,
                    self.partitions.clone(),
                    self.poll_size,
                    settings,
                ))
            })
            .clone()
    }

    /// Consumer group by name, if it exists
    pub fn existing_group(&self, name: &str) -> Option<Arc<ConsumerGroup>> {
        self.groups.read().get(name).cloned()
    }

    /// Partition a key would route to, without appending anything
    pub fn partition_for_key(&self, key: Option<&[u8]>) -> i32 {
        partition_for_key(key, self.partitions.len()) as i32
    }
}

/// Partition index for a key: `crc32(key) mod count`, always in range.
/// Keyless records route to partition 0 so key-free producers still get
/// a deterministic, strictly ordered destination.
pub(crate) fn partition_for_key(key: Option<&[u8]>, count: usize) -> usize {
    match key {
        Some(key) => crc32fast::hash(key) as usize % count,
        None => 0,
    }
}
