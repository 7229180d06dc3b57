//! Record types for membroker storage

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A key/value pair appended to a topic
///
/// `key` and `value` use [`Bytes`], so cloning a record is O(1); the
/// broker copies records by value without copying payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Optional routing key; records with the same key land on the same
    /// partition. `None` routes to partition 0.
    pub key: Option<Bytes>,

    /// Record payload
    pub value: Bytes,

    /// Timestamp of the record (milliseconds since epoch), captured when
    /// the producer handed the record to the broker
    pub timestamp: i64,
}

impl Record {
    /// Create a new record with the current timestamp
    pub fn new(key: Option<Bytes>, value: Bytes) -> Self {
        Self {
            key,
            value,
            timestamp: current_time_ms(),
        }
    }

    /// Approximate size of this record in bytes
    pub fn size(&self) -> usize {
        let key_size = self.key.as_ref().map(|k| k.len()).unwrap_or(0);
        // 8 bytes for the timestamp + key + value
        8 + key_size + self.value.len()
    }
}

/// A [`Record`] annotated with where it landed
///
/// Created by a partition at append time and immutable thereafter.
/// Offsets are partition-local, start at 1, increase strictly, and are
/// never reused even after the record is evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Topic the record was appended to
    pub topic: String,

    /// Partition the record landed on
    pub partition: i32,

    /// Partition-local offset
    pub offset: i64,

    /// The record itself
    pub record: Record,
}

pub(crate) fn current_time_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
