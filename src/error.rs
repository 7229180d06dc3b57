//! Error types for membroker
//!
//! Configuration problems are surfaced synchronously to the caller that
//! triggered topic creation. Handler failures are contained inside the
//! consumption loop that observed them and never propagate to other
//! consumers; see [`crate::consumer::CommitMode`] for the retry semantics.

use thiserror::Error;

/// Result type alias for membroker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors produced by the broker
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A topic was referenced that has no configuration and auto-create
    /// is disabled. Raised at topic-creation time, before any partition
    /// is built.
    #[error("topic '{0}' has no configuration and auto-create is disabled")]
    TopicNotConfigured(String),

    /// A configuration value failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The same consumer object was subscribed twice to a group.
    /// Programmer error; raised immediately rather than swallowed.
    #[error("consumer is already subscribed to group '{group}' on topic '{topic}'")]
    AlreadySubscribed {
        /// Consumer group name
        group: String,
        /// Topic name
        topic: String,
    },

    /// A record handler reported a failure. Never returned by broker
    /// APIs; exists so handlers have a typed error to hand back to
    /// their consumption loop.
    #[error("record handler failed: {0}")]
    Handler(String),
}

impl BrokerError {
    /// Convenience constructor for handler failures
    pub fn handler(msg: impl Into<String>) -> Self {
        BrokerError::Handler(msg.into())
    }

    /// Convenience constructor for configuration validation failures
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        BrokerError::InvalidConfig(msg.into())
    }
}
