//! Storage layer: topics, partitions, and the records they hold
//!
//! Everything here is in-memory and process-local. A topic owns a fixed
//! set of partitions; each partition is a bounded, ordered append log
//! with partition-local offsets and oldest-first eviction.

mod partition;
mod record;
mod topic;

pub use partition::Partition;
pub use record::{Record, RecordMetadata};
pub use topic::Topic;
