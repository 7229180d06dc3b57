//! Configuration for the broker
//!
//! Settings are resolved once, at topic or group creation time, and are
//! fixed thereafter: a topic's partition count never changes, and a group
//! keeps the poll parameters it was created with. Per-name overrides take
//! precedence over the defaults.

use crate::consumer::AssignmentStrategy;
use crate::error::{BrokerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default number of partitions for auto-created topics
pub const DEFAULT_PARTITIONS: i32 = 1;

/// Default retention capacity (records per partition)
pub const DEFAULT_RETENTION_CAPACITY: usize = 10_000;

/// Default maximum records fetched per partition per poll
pub const DEFAULT_POLL_SIZE: usize = 500;

/// Default idle-park interval for consumption loops
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1_000;

/// Default join timeout when stopping a consumption loop
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;

/// Default delay before a failed batch is redelivered
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Per-topic settings, fixed at topic creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSettings {
    /// Number of partitions
    pub partitions: i32,

    /// Maximum records retained per partition; the oldest record is
    /// evicted when the bound is exceeded
    pub retention_capacity: usize,

    /// Maximum records fetched per partition per poll iteration
    pub poll_size: usize,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            retention_capacity: DEFAULT_RETENTION_CAPACITY,
            poll_size: DEFAULT_POLL_SIZE,
        }
    }
}

impl TopicSettings {
    /// Set the partition count
    pub fn with_partitions(mut self, partitions: i32) -> Self {
        self.partitions = partitions;
        self
    }

    /// Set the retention capacity
    pub fn with_retention_capacity(mut self, capacity: usize) -> Self {
        self.retention_capacity = capacity;
        self
    }

    /// Set the per-partition poll size
    pub fn with_poll_size(mut self, poll_size: usize) -> Self {
        self.poll_size = poll_size;
        self
    }

    fn validate(&self, topic: &str) -> Result<()> {
        if self.partitions < 1 {
            return Err(BrokerError::invalid_config(format!(
                "topic '{}': partitions must be >= 1, got {}",
                topic, self.partitions
            )));
        }
        if self.retention_capacity == 0 {
            return Err(BrokerError::invalid_config(format!(
                "topic '{}': retention_capacity must be >= 1",
                topic
            )));
        }
        if self.poll_size == 0 {
            return Err(BrokerError::invalid_config(format!(
                "topic '{}': poll_size must be >= 1",
                topic
            )));
        }
        Ok(())
    }
}

/// Per-group settings, fixed at group creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Partition assignment strategy
    pub assignment: AssignmentStrategy,

    /// How long an idle consumption loop parks before re-polling.
    /// Appends wake parked loops immediately, so this is a ceiling,
    /// not a polling cadence.
    pub wait_timeout_ms: u64,

    /// How long unsubscribe waits for the consumption loop to stop
    /// before logging the task as leaked
    pub stop_timeout_ms: u64,

    /// Delay before a batch rejected by the handler is redelivered
    pub retry_backoff_ms: u64,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            assignment: AssignmentStrategy::RoundRobin,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl GroupSettings {
    /// Set the assignment strategy
    pub fn with_assignment(mut self, assignment: AssignmentStrategy) -> Self {
        self.assignment = assignment;
        self
    }

    /// Set the idle-park interval
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the loop stop timeout
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the redelivery backoff
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Idle-park interval as a [`Duration`]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Loop stop timeout as a [`Duration`]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Redelivery backoff as a [`Duration`]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Complete broker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Defaults applied to topics without an explicit entry
    pub topic_defaults: TopicSettings,

    /// Per-topic overrides
    pub topics: HashMap<String, TopicSettings>,

    /// Whether referencing an unconfigured topic creates it from the
    /// defaults. When disabled, such a reference is a configuration
    /// error surfaced to the caller.
    pub auto_create_topics: bool,

    /// Defaults applied to groups without an explicit entry
    pub group_defaults: GroupSettings,

    /// Per-group overrides
    pub groups: HashMap<String, GroupSettings>,
}

impl BrokerConfig {
    /// Configuration with auto-create enabled and library defaults
    pub fn new() -> Self {
        Self {
            auto_create_topics: true,
            ..Default::default()
        }
    }

    /// Add or replace settings for a topic
    pub fn with_topic(mut self, name: impl Into<String>, settings: TopicSettings) -> Self {
        self.topics.insert(name.into(), settings);
        self
    }

    /// Add or replace settings for a consumer group
    pub fn with_group(mut self, name: impl Into<String>, settings: GroupSettings) -> Self {
        self.groups.insert(name.into(), settings);
        self
    }

    /// Enable or disable topic auto-creation
    pub fn with_auto_create_topics(mut self, enabled: bool) -> Self {
        self.auto_create_topics = enabled;
        self
    }

    /// Resolve settings for a topic, validating them.
    ///
    /// Falls back to the defaults when auto-create is enabled; otherwise
    /// an unconfigured topic is a [`BrokerError::TopicNotConfigured`].
    pub fn topic_settings(&self, name: &str) -> Result<TopicSettings> {
        let settings = match self.topics.get(name) {
            Some(settings) => settings.clone(),
            None if self.auto_create_topics => self.topic_defaults.clone(),
            None => return Err(BrokerError::TopicNotConfigured(name.to_string())),
        };
        settings.validate(name)?;
        Ok(settings)
    }

    /// Resolve settings for a consumer group
    pub fn group_settings(&self, name: &str) -> GroupSettings {
        self.groups
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.group_defaults.clone())
    }
}
