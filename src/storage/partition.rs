//! Partition implementation for membroker storage
//!
//! A partition is one ordered, bounded shard of a topic's log. Records
//! are appended at the tail with a strictly increasing offset; when the
//! retention capacity is exceeded the oldest record is evicted first.
//! Evicted offsets are never reused.
//!
//! The log is guarded by a reader/writer lock: reads proceed concurrently
//! with each other and exclude only appends. This is the broker's hot-path
//! lock; nothing is held across an await.

use crate::storage::record::{Record, RecordMetadata};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// A partition in a topic
pub struct Partition {
    /// Topic name
    topic: String,

    /// Partition ID
    id: i32,

    /// Maximum records retained
    capacity: usize,

    /// Next offset to assign; offsets start at 1
    next_offset: AtomicI64,

    /// Retained records, ordered by offset ascending
    records: RwLock<VecDeque<RecordMetadata>>,
}

impl Partition {
    /// Create a new, empty partition
    pub(crate) fn new(topic: &str, id: i32, capacity: usize) -> Self {
        debug!(topic = %topic, partition = id, capacity, "Partition created");
        Self {
            topic: topic.to_string(),
            id,
            capacity,
            next_offset: AtomicI64::new(1),
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Partition ID
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Topic this partition belongs to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Append a record, assigning it the next offset.
    ///
    /// Evicts the oldest record when the retention capacity would be
    /// exceeded. Always succeeds.
    pub fn append(&self, record: Record) -> RecordMetadata {
        let mut records = self.records.write();
        // Offset assigned under the write lock so the log stays sorted
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        let meta = RecordMetadata {
            topic: self.topic.clone(),
            partition: self.id,
            offset,
            record,
        };
        records.push_back(meta.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }
        meta
    }

    /// Up to `max` records with `offset > after_offset`, ascending.
    ///
    /// Returns an empty vec when nothing qualifies; that is not an error.
    /// Safe to call concurrently with appends and other reads.
    pub fn records_after(&self, after_offset: i64, max: usize) -> Vec<RecordMetadata> {
        let records = self.records.read();
        let start = records.partition_point(|r| r.offset <= after_offset);
        records.iter().skip(start).take(max).cloned().collect()
    }

    /// Offset of the most recently appended record, 0 if nothing was
    /// ever appended. Resolves the `Latest` offset reset for consumers
    /// with no prior commit.
    pub fn latest_offset(&self) -> i64 {
        self.next_offset.load(Ordering::SeqCst) - 1
    }

    /// Offset of the oldest retained record, or `None` when the
    /// partition is empty
    pub fn earliest_offset(&self) -> Option<i64> {
        self.records.read().front().map(|r| r.offset)
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the partition retains no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn record(value: &str) -> Record {
        Record::new(None, Bytes::from(value.to_string()))
    }

    #[test]
    fn test_append_assigns_increasing_offsets_from_one() {
        let partition = Partition::new("t", 0, 100);
        assert_eq!(partition.latest_offset(), 0);

        let first = partition.append(record("a"));
        let second = partition.append(record("b"));
        assert_eq!(first.offset, 1);
        assert_eq!(second.offset, 2);
        assert_eq!(partition.latest_offset(), 2);
    }

    #[test]
    fn test_records_after_returns_append_order() {
        let partition = Partition::new("t", 0, 100);
        for i in 0..5 {
            partition.append(record(&format!("v{}", i)));
        }

        let records = partition.records_after(0, 10);
        assert_eq!(records.len(), 5);
        let offsets: Vec<i64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![1, 2, 3, 4, 5]);
        assert_eq!(records[0].record.value, Bytes::from("v0"));
        assert_eq!(records[4].record.value, Bytes::from("v4"));
    }

    #[test]
    fn test_records_after_respects_exclusive_bound_and_max() {
        let partition = Partition::new("t", 0, 100);
        for i in 0..10 {
            partition.append(record(&format!("v{}", i)));
        }

        let records = partition.records_after(3, 4);
        let offsets: Vec<i64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![4, 5, 6, 7]);

        // Past the end: empty, not an error
        assert!(partition.records_after(10, 4).is_empty());
    }

    #[test]
    fn test_eviction_keeps_newest_records() {
        // Capacity 3, four appends: offset 1 must be gone
        let partition = Partition::new("t", 0, 3);
        for i in 0..4 {
            partition.append(record(&format!("v{}", i)));
        }

        assert_eq!(partition.len(), 3);
        let offsets: Vec<i64> = partition
            .records_after(0, 10)
            .iter()
            .map(|r| r.offset)
            .collect();
        assert_eq!(offsets, vec![2, 3, 4]);
        assert_eq!(partition.earliest_offset(), Some(2));
        // Offsets keep increasing past evictions
        assert_eq!(partition.latest_offset(), 4);
    }

    #[test]
    fn test_empty_partition() {
        let partition = Partition::new("t", 7, 10);
        assert!(partition.is_empty());
        assert_eq!(partition.id(), 7);
        assert_eq!(partition.earliest_offset(), None);
        assert!(partition.records_after(0, 10).is_empty());
    }

    #[test]
    fn test_concurrent_appends_stay_ordered() {
        use std::sync::Arc;

        let partition = Arc::new(Partition::new("t", 0, 10_000));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let partition = partition.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    partition.append(Record::new(None, Bytes::from_static(b"x")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let records = partition.records_after(0, 2000);
        assert_eq!(records.len(), 1000);
        for window in records.windows(2) {
            assert!(window[0].offset < window[1].offset);
        }
    }
}
