//! Consumer group coordination
//!
//! A [`ConsumerGroup`] tracks the consumers sharing a group name on a
//! topic, computes which member owns which partition, and stores the
//! commit offsets shared by the whole group. Membership changes trigger
//! a rebalance; partitions moved between members resume from the group's
//! last committed offset, not from zero.
//!
//! All group state lives behind one group-wide reader/writer lock:
//! rebalancing and commits take it exclusively, the poll-loop assignment
//! snapshot takes it shared. Rebalancing is stop-the-world for this
//! group only; it never blocks partition reads or writes for other
//! groups or topics.

use crate::config::GroupSettings;
use crate::consumer::assignment::{compute_assignment, PartitionStrategy};
use crate::consumer::policy::OffsetReset;
use crate::consumer::{poll_loop, Consumer, TopicPartition};
use crate::error::{BrokerError, Result};
use crate::storage::Partition;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identity of a subscribed consumer: the address of the consumer object.
/// Subscribing the same `Arc` twice is a programmer error; two distinct
/// objects of the same type are two members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemberId(usize);

impl MemberId {
    fn of(consumer: &Arc<dyn Consumer>) -> Self {
        Self(Arc::as_ptr(consumer) as *const () as usize)
    }
}

struct Member {
    id: MemberId,
    consumer: Arc<dyn Consumer>,
    /// Partition IDs owned by this member, ascending
    assigned: Vec<i32>,
    /// Observed by the member's consumption loop each iteration
    shutdown: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

/// Ownership changes for one member, recorded during a rebalance and
/// reported through the assignment listeners only after the group lock
/// is released, so listeners may call back into the group.
struct AssignmentDiff {
    consumer: Arc<dyn Consumer>,
    unassigned: Vec<TopicPartition>,
    assigned: Vec<TopicPartition>,
}

fn dispatch_assignment_diffs(diffs: Vec<AssignmentDiff>) {
    for diff in diffs {
        if !diff.unassigned.is_empty() {
            diff.consumer.on_partitions_unassigned(&diff.unassigned);
        }
        if !diff.assigned.is_empty() {
            diff.consumer.on_partitions_assigned(&diff.assigned);
        }
    }
}

#[derive(Default)]
struct GroupState {
    /// Members in subscription order; assignment strategies index into
    /// this ordering
    members: Vec<Member>,
    /// Committed offset per partition ID, shared by the whole group
    commits: HashMap<i32, i64>,
}

/// The coordinator for all consumers sharing a group name on a topic
pub struct ConsumerGroup {
    name: String,
    topic: String,
    /// The topic's partitions, indexed by partition ID
    partitions: Vec<Arc<Partition>>,
    strategy: Box<dyn PartitionStrategy>,
    poll_size: usize,
    wait_timeout: Duration,
    stop_timeout: Duration,
    retry_backoff: Duration,
    state: RwLock<GroupState>,
    /// Signaled on append and on membership changes; parked consumption
    /// loops wait on it
    data_ready: Notify,
}

impl ConsumerGroup {
    pub(crate) fn new(
        name: &str,
        topic: &str,
        partitions: Vec<Arc<Partition>>,
        poll_size: usize,
        settings: GroupSettings,
    ) -> Self {
        Self {
            name: name.to_string(),
            topic: topic.to_string(),
            partitions,
            strategy: settings.assignment.build(),
            poll_size,
            wait_timeout: settings.wait_timeout(),
            stop_timeout: settings.stop_timeout(),
            retry_backoff: settings.retry_backoff(),
            state: RwLock::new(GroupState::default()),
            data_ready: Notify::new(),
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topic this group consumes
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of subscribed members
    pub fn member_count(&self) -> usize {
        self.state.read().members.len()
    }

    /// The group's committed offset for a partition, if any
    pub fn committed(&self, partition: i32) -> Option<i64> {
        self.state.read().commits.get(&partition).copied()
    }

    /// Snapshot of all committed offsets by partition ID
    pub fn committed_offsets(&self) -> HashMap<i32, i64> {
        self.state.read().commits.clone()
    }

    /// Add a consumer to the group, rebalance, and start its
    /// consumption loop.
    ///
    /// Must be called from within a tokio runtime. Subscribing the same
    /// consumer object twice is an error.
    pub(crate) fn subscribe(self: &Arc<Self>, consumer: Arc<dyn Consumer>) -> Result<()> {
        let member_id = MemberId::of(&consumer);
        let shutdown = Arc::new(AtomicBool::new(false));

        let diffs = {
            let mut state = self.state.write();
            if state.members.iter().any(|m| m.id == member_id) {
                return Err(BrokerError::AlreadySubscribed {
                    group: self.name.clone(),
                    topic: self.topic.clone(),
                });
            }

            state.members.push(Member {
                id: member_id,
                consumer: consumer.clone(),
                assigned: Vec::new(),
                shutdown: shutdown.clone(),
                task: None,
            });
            let diffs = self.rebalance(&mut state);

            let task = tokio::spawn(poll_loop::run(
                self.clone(),
                consumer,
                member_id,
                shutdown,
            ));
            // Still under the write lock, so the member cannot have moved
            if let Some(member) = state.members.iter_mut().find(|m| m.id == member_id) {
                member.task = Some(task);
            }

            info!(
                group = %self.name,
                topic = %self.topic,
                members = state.members.len(),
                "Consumer subscribed"
            );
            diffs
        };

        dispatch_assignment_diffs(diffs);
        // Wake parked loops so they notice the new assignment promptly
        self.data_ready.notify_waiters();
        Ok(())
    }

    /// Remove a consumer from the group, rebalance the remainder, and
    /// stop its consumption loop.
    ///
    /// Idempotent: unsubscribing a consumer that is not a member is a
    /// no-op. Waits up to the group's stop timeout for the loop to exit
    /// and logs the task as leaked if it does not.
    pub(crate) async fn unsubscribe(&self, consumer: &Arc<dyn Consumer>) -> Result<()> {
        let member_id = MemberId::of(consumer);

        let (member, diffs) = {
            let mut state = self.state.write();
            let Some(index) = state.members.iter().position(|m| m.id == member_id) else {
                return Ok(());
            };
            let member = state.members.remove(index);

            let mut diffs = Vec::new();
            if !member.assigned.is_empty() {
                diffs.push(AssignmentDiff {
                    consumer: member.consumer.clone(),
                    unassigned: self.to_topic_partitions(&member.assigned),
                    assigned: Vec::new(),
                });
            }
            if !state.members.is_empty() {
                diffs.extend(self.rebalance(&mut state));
            }

            info!(
                group = %self.name,
                topic = %self.topic,
                members = state.members.len(),
                "Consumer unsubscribed"
            );
            (member, diffs)
        };

        dispatch_assignment_diffs(diffs);

        member.shutdown.store(true, Ordering::Release);
        // Wake the loop so it observes the shutdown flag now, not at the
        // end of its wait interval
        self.data_ready.notify_waiters();

        if let Some(task) = member.task {
            match tokio::time::timeout(self.stop_timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!(
                        group = %self.name,
                        topic = %self.topic,
                        error = %join_err,
                        "Consumption loop task failed"
                    );
                }
                Err(_) => {
                    warn!(
                        group = %self.name,
                        topic = %self.topic,
                        timeout_ms = self.stop_timeout.as_millis() as u64,
                        "Consumption loop did not stop in time; task leaked"
                    );
                }
            }
        }

        Ok(())
    }

    /// Record the group's committed offset for a partition.
    ///
    /// Monotonic: an offset at or below the stored commit is ignored, so
    /// replayed commits cannot move the position backwards.
    pub fn commit(&self, partition: i32, offset: i64) {
        let mut state = self.state.write();
        match state.commits.entry(partition) {
            Entry::Occupied(mut entry) => {
                if offset > *entry.get() {
                    entry.insert(offset);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(offset);
            }
        }
    }

    /// Recompute the assignment over the current members.
    ///
    /// Caller holds the write lock. Returns the symmetric difference for
    /// each member whose partition set changed; the caller reports them
    /// through the assignment listeners after releasing the lock.
    fn rebalance(&self, state: &mut GroupState) -> Vec<AssignmentDiff> {
        let owners = compute_assignment(
            self.strategy.as_ref(),
            self.partitions.len(),
            state.members.len(),
        );

        let mut diffs = Vec::new();
        for (member_index, member) in state.members.iter_mut().enumerate() {
            let assigned: Vec<i32> = owners
                .iter()
                .enumerate()
                .filter(|(_, owner)| **owner == member_index)
                .map(|(partition, _)| partition as i32)
                .collect();

            if assigned == member.assigned {
                continue;
            }

            let removed: Vec<i32> = member
                .assigned
                .iter()
                .copied()
                .filter(|p| !assigned.contains(p))
                .collect();
            let added: Vec<i32> = assigned
                .iter()
                .copied()
                .filter(|p| !member.assigned.contains(p))
                .collect();

            diffs.push(AssignmentDiff {
                consumer: member.consumer.clone(),
                unassigned: self.to_topic_partitions(&removed),
                assigned: self.to_topic_partitions(&added),
            });

            member.assigned = assigned;
        }

        debug!(
            group = %self.name,
            topic = %self.topic,
            members = state.members.len(),
            partitions = self.partitions.len(),
            "Group rebalanced"
        );

        diffs
    }

    fn to_topic_partitions(&self, partitions: &[i32]) -> Vec<TopicPartition> {
        partitions
            .iter()
            .map(|p| (self.topic.clone(), *p))
            .collect()
    }

    /// The partitions currently assigned to a member, ordered by ID.
    /// Taken under the shared lock: a snapshot, consistent with respect
    /// to any concurrent rebalance.
    pub(crate) fn assignment_snapshot(&self, member: MemberId) -> Vec<Arc<Partition>> {
        let state = self.state.read();
        state
            .members
            .iter()
            .find(|m| m.id == member)
            .map(|m| {
                m.assigned
                    .iter()
                    .map(|p| self.partitions[*p as usize].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Where a member should start reading a partition: the group's
    /// commit if one exists, otherwise the member's offset reset policy.
    pub(crate) fn resume_offset(&self, partition: &Partition, reset: OffsetReset) -> i64 {
        if let Some(committed) = self.committed(partition.id()) {
            return committed;
        }
        match reset {
            OffsetReset::Earliest => 0,
            OffsetReset::Latest => partition.latest_offset(),
        }
    }

    /// Wake every parked consumption loop in this group
    pub(crate) fn wake(&self) {
        self.data_ready.notify_waiters();
    }

    /// Future resolved by the next [`wake`](Self::wake). Arm it before
    /// scanning for data so an append between the scan and the park is
    /// not missed.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.data_ready.notified()
    }

    pub(crate) fn poll_size(&self) -> usize {
        self.poll_size
    }

    pub(crate) fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub(crate) fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }
}
