//! Consumer groups: membership, partition assignment, offsets, and the
//! per-consumer consumption loop
//!
//! Consumers sharing a group name on a topic split its partitions among
//! themselves. Each partition is owned by at most one member at a time,
//! commit offsets are shared by the whole group, and membership changes
//! trigger a rebalance under a group-wide lock.

mod assignment;
pub(crate) mod group;
mod policy;
mod poll_loop;

pub use assignment::{AllToFirst, AssignmentStrategy, PartitionStrategy, RoundRobin};
pub use group::ConsumerGroup;
pub use policy::{CommitMode, OffsetReset};

use crate::error::Result;
use crate::storage::RecordMetadata;
use async_trait::async_trait;

/// Topic partition identifier
pub type TopicPartition = (String, i32);

/// A consumer participating in a consumer group.
///
/// Supplied by the application and held by the broker for the duration
/// of the subscription. One consumption loop task runs per subscribed
/// consumer; it calls [`handle_records`](Consumer::handle_records) with
/// batches read from the partitions currently assigned to this consumer.
///
/// The assignment listener methods default to no-ops; override them to
/// observe ownership changes during rebalances.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Consumer group name
    fn group(&self) -> &str;

    /// Topic to consume from
    fn topic(&self) -> &str;

    /// Where to start reading a partition the group has never committed
    fn offset_reset(&self) -> OffsetReset {
        OffsetReset::Latest
    }

    /// When a read position becomes the group's committed offset
    fn commit_mode(&self) -> CommitMode {
        CommitMode::AfterProcessing
    }

    /// Process one batch of records.
    ///
    /// The batch is ordered by partition, then offset, and is never
    /// empty. Returning an error keeps the batch uncommitted under
    /// [`CommitMode::AfterProcessing`], so it is redelivered on the next
    /// poll; under [`CommitMode::BeforeProcessing`] the offsets are
    /// already committed and the batch is dropped.
    async fn handle_records(&self, batch: Vec<RecordMetadata>) -> Result<()>;

    /// Called when this consumer gains ownership of partitions
    fn on_partitions_assigned(&self, _partitions: &[TopicPartition]) {}

    /// Called when this consumer loses ownership of partitions
    fn on_partitions_unassigned(&self, _partitions: &[TopicPartition]) {}
}
