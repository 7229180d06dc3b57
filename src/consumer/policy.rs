//! Offset and commit policies for consumers

use serde::{Deserialize, Serialize};

/// Where a consumer starts reading a partition the group has never
/// committed an offset for. Ignored once a commit exists: a reassigned
/// partition always resumes from the group's last committed offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetReset {
    /// Start at the beginning and replay everything still retained
    Earliest,

    /// Start at the current end of the partition and skip history
    #[default]
    Latest,
}

/// When a consumer's read position becomes the group's committed offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Commit as soon as records are read, before the handler runs.
    ///
    /// At-most-once: if the handler fails, the offsets are already
    /// committed and the batch is **not** redelivered. This loss is the
    /// policy's contract, not something the loop compensates for.
    BeforeProcessing,

    /// Commit only after the handler returns successfully.
    ///
    /// At-least-once: a failed batch stays uncommitted and is
    /// redelivered on the next poll. A handler that always fails keeps
    /// its partitions assigned while making no progress; this broker
    /// has no group-membership timeout to rebalance them away.
    #[default]
    AfterProcessing,
}
