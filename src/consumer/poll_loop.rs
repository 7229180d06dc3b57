//! The per-consumer consumption loop
//!
//! One loop task runs per subscribed consumer. Each iteration snapshots
//! the partitions currently assigned to the consumer, reads forward from
//! its last positions, and hands the batch to the consumer's handler.
//! When no assigned partition has new data the loop parks on the group's
//! wakeup signal (bounded by the group's wait timeout), so there is no
//! busy polling.
//!
//! Handler failures never escape the task: they are logged with the
//! partition/offset pairs of the stuck batch and resolved according to
//! the consumer's [`CommitMode`]. The loop exits when its consumer is
//! unsubscribed.

use crate::consumer::group::{ConsumerGroup, MemberId};
use crate::consumer::policy::CommitMode;
use crate::consumer::Consumer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) async fn run(
    group: Arc<ConsumerGroup>,
    consumer: Arc<dyn Consumer>,
    member: MemberId,
    shutdown: Arc<AtomicBool>,
) {
    // Last-read offset per owned partition. The group commit is
    // re-checked on every read, so a partition lost and re-acquired
    // between iterations resumes from the commit, not from whatever
    // this loop last saw.
    let mut positions: HashMap<i32, i64> = HashMap::new();

    debug!(group = %group.name(), topic = %group.topic(), "Consumption loop started");

    loop {
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        // Armed before scanning: an append landing after the scan but
        // before the park still wakes us.
        let wakeup = group.notified();
        tokio::pin!(wakeup);
        wakeup.as_mut().enable();

        let assigned = group.assignment_snapshot(member);
        positions.retain(|id, _| assigned.iter().any(|p| p.id() == *id));

        // Partitions come back ordered by ID, so the flattened batch is
        // ordered by partition, then offset.
        let mut batch = Vec::new();
        let mut read_up_to: Vec<(i32, i64)> = Vec::new();
        for partition in &assigned {
            let position = positions.entry(partition.id()).or_insert_with(|| {
                group.resume_offset(partition, consumer.offset_reset())
            });
            // The local position goes stale when the partition was owned
            // by another member since this loop last read it. The group
            // commit is monotonic and covers the interim owner's progress.
            if let Some(committed) = group.committed(partition.id()) {
                if committed > *position {
                    *position = committed;
                }
            }
            let position = *position;
            let records = partition.records_after(position, group.poll_size());
            if let Some(last) = records.last() {
                read_up_to.push((partition.id(), last.offset));
            }
            batch.extend(records);
        }

        if batch.is_empty() {
            tokio::select! {
                _ = &mut wakeup => {}
                _ = tokio::time::sleep(group.wait_timeout()) => {}
            }
            continue;
        }

        match consumer.commit_mode() {
            CommitMode::BeforeProcessing => {
                for (partition, offset) in &read_up_to {
                    positions.insert(*partition, *offset);
                    group.commit(*partition, *offset);
                }
                if let Err(err) = consumer.handle_records(batch).await {
                    // Offsets are already committed: the batch is dropped,
                    // by the policy's at-most-once contract.
                    warn!(
                        group = %group.name(),
                        topic = %group.topic(),
                        read_up_to = ?read_up_to,
                        error = %err,
                        "Handler failed after commit; batch will not be redelivered"
                    );
                }
            }
            CommitMode::AfterProcessing => match consumer.handle_records(batch).await {
                Ok(()) => {
                    for (partition, offset) in &read_up_to {
                        positions.insert(*partition, *offset);
                        group.commit(*partition, *offset);
                    }
                }
                Err(err) => {
                    warn!(
                        group = %group.name(),
                        topic = %group.topic(),
                        stuck = ?read_up_to,
                        error = %err,
                        "Handler failed; batch will be redelivered"
                    );
                    // Positions untouched: the next poll re-reads the same
                    // batch. The backoff keeps a permanently failing
                    // handler from spinning.
                    tokio::time::sleep(group.retry_backoff()).await;
                }
            },
        }
    }

    debug!(group = %group.name(), topic = %group.topic(), "Consumption loop stopped");
}
