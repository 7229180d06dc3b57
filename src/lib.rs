//! # membroker
//!
//! An in-process, in-memory emulation of a partitioned publish/subscribe
//! log broker, for development and testing. A single process stands in
//! for a real broker cluster: producers append records to named topics;
//! consumer groups read them back with partition-based load sharing,
//! shared commit offsets, and rebalancing on membership changes.
//!
//! ## Guarantees
//!
//! - Per-partition delivery in append order, with strictly increasing
//!   partition-local offsets starting at 1
//! - Each partition owned by at most one member of a group at a time;
//!   every partition owned whenever the group is non-empty
//! - Bounded memory: each partition retains at most its configured
//!   capacity, evicting oldest-first
//! - At-least-once delivery under handler failure with
//!   [`CommitMode::AfterProcessing`]; at-most-once with
//!   [`CommitMode::BeforeProcessing`]
//!
//! Not provided: durability across restarts, cross-process distribution,
//! exactly-once delivery, transactions.
//!
//! ## Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use membroker::{Broker, Consumer, OffsetReset, RecordMetadata, Result};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Consumer for Printer {
//!     fn group(&self) -> &str { "printers" }
//!     fn topic(&self) -> &str { "orders" }
//!     fn offset_reset(&self) -> OffsetReset { OffsetReset::Earliest }
//!     async fn handle_records(&self, batch: Vec<RecordMetadata>) -> Result<()> {
//!         for record in batch {
//!             println!("p{} @{}: {:?}", record.partition, record.offset, record.record.value);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let broker = Broker::in_memory();
//!     let consumer: Arc<dyn Consumer> = Arc::new(Printer);
//!     broker.subscribe(consumer.clone())?;
//!     broker.append("orders", Some(Bytes::from("k1")), Bytes::from("hello"))?;
//!     // ... later
//!     broker.unsubscribe(&consumer).await?;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod consumer;
pub mod error;
pub mod storage;

pub use broker::Broker;
pub use config::{BrokerConfig, GroupSettings, TopicSettings};
pub use consumer::{
    AssignmentStrategy, CommitMode, Consumer, ConsumerGroup, OffsetReset, PartitionStrategy,
    TopicPartition,
};
pub use error::{BrokerError, Result};
pub use storage::{Partition, Record, RecordMetadata, Topic};
