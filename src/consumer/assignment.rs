//! Partition assignment strategies for consumer groups
//!
//! A strategy is a pure function from (partition index, member count) to
//! the owning member's index. Evaluated over every partition index it
//! yields a complete assignment: each partition owned by exactly one
//! member, no partition left out.

use serde::{Deserialize, Serialize};

/// Trait for partition assignment strategies
///
/// Implementations must be deterministic. Never invoked with
/// `member_count == 0`; out-of-range results are reduced modulo the
/// member count so coverage holds regardless.
pub trait PartitionStrategy: Send + Sync {
    /// Index of the member owning `partition`, given `member_count`
    /// members ordered by subscription time
    fn owner(&self, partition: usize, member_count: usize) -> usize;
}

/// Spread partitions across members round-robin (`partition % members`)
pub struct RoundRobin;

impl PartitionStrategy for RoundRobin {
    fn owner(&self, partition: usize, member_count: usize) -> usize {
        partition % member_count
    }
}

/// Assign every partition to the first member.
///
/// Used for strict-ordering topologies where one consumer must observe
/// every partition; remaining members are warm standbys that take over
/// when earlier members unsubscribe.
pub struct AllToFirst;

impl PartitionStrategy for AllToFirst {
    fn owner(&self, _partition: usize, _member_count: usize) -> usize {
        0
    }
}

/// Config-facing strategy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// [`RoundRobin`]
    #[default]
    RoundRobin,

    /// [`AllToFirst`]
    AllToFirst,
}

impl AssignmentStrategy {
    pub(crate) fn build(&self) -> Box<dyn PartitionStrategy> {
        match self {
            AssignmentStrategy::RoundRobin => Box::new(RoundRobin),
            AssignmentStrategy::AllToFirst => Box::new(AllToFirst),
        }
    }
}

/// Owning member index per partition index.
///
/// Reduces each owner modulo `member_count`, so every partition has
/// exactly one in-range owner even for a misbehaving strategy.
pub(crate) fn compute_assignment(
    strategy: &dyn PartitionStrategy,
    partition_count: usize,
    member_count: usize,
) -> Vec<usize> {
    debug_assert!(member_count > 0);
    (0..partition_count)
        .map(|partition| strategy.owner(partition, member_count) % member_count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_spreads_partitions() {
        let owners = compute_assignment(&RoundRobin, 4, 2);
        assert_eq!(owners, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_round_robin_single_member_gets_everything() {
        let owners = compute_assignment(&RoundRobin, 3, 1);
        assert_eq!(owners, vec![0, 0, 0]);
    }

    #[test]
    fn test_all_to_first() {
        let owners = compute_assignment(&AllToFirst, 5, 3);
        assert_eq!(owners, vec![0; 5]);
    }

    #[test]
    fn test_assignment_covers_every_partition_with_one_owner() {
        // Coverage and exclusivity hold for any member/partition mix
        for members in 1..6 {
            for partitions in 0..10 {
                let owners = compute_assignment(&RoundRobin, partitions, members);
                assert_eq!(owners.len(), partitions);
                for owner in owners {
                    assert!(owner < members);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_owner_is_reduced() {
        struct Broken;
        impl PartitionStrategy for Broken {
            fn owner(&self, partition: usize, _member_count: usize) -> usize {
                partition + 100
            }
        }

        let owners = compute_assignment(&Broken, 4, 3);
        for owner in owners {
            assert!(owner < 3);
        }
    }

    #[test]
    fn test_strategy_selector_builds_matching_strategy() {
        let round_robin = AssignmentStrategy::RoundRobin.build();
        assert_eq!(round_robin.owner(3, 2), 1);

        let all_to_first = AssignmentStrategy::AllToFirst.build();
        assert_eq!(all_to_first.owner(3, 2), 0);
    }
}
