//! The broker: topic registry plus the producer/consumer facade
//!
//! A [`Broker`] owns its topics and is an explicit handle, not a
//! process-wide singleton; tests construct isolated instances freely.
//! Topics are created lazily on first reference, by a producer or by a
//! subscribing consumer, and live for the broker's lifetime.

use crate::config::BrokerConfig;
use crate::consumer::Consumer;
use crate::error::Result;
use crate::storage::{RecordMetadata, Topic};
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// An in-process, in-memory pub/sub broker
///
/// # Example
///
/// ```ignore
/// use membroker::{Broker, BrokerConfig};
/// use bytes::Bytes;
///
/// let broker = Broker::new(BrokerConfig::new());
/// let meta = broker.append("orders", Some(Bytes::from("k1")), Bytes::from("v1"))?;
/// println!("appended to partition {} at offset {}", meta.partition, meta.offset);
/// # membroker::Result::Ok(())
/// ```
pub struct Broker {
    config: BrokerConfig,
    /// Topics by name; created once on first reference
    topics: DashMap<String, Arc<Topic>>,
}

impl Broker {
    /// Create a broker with the given configuration
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            topics: DashMap::new(),
        }
    }

    /// Create a broker with default configuration (topic auto-create on)
    pub fn in_memory() -> Self {
        Self::new(BrokerConfig::new())
    }

    /// Get or create a topic.
    ///
    /// Settings are looked up once, at creation; concurrent calls for
    /// the same name observe a single instance. Referencing an
    /// unconfigured topic with auto-create disabled is an error.
    pub fn topic(&self, name: &str) -> Result<Arc<Topic>> {
        if let Some(topic) = self.topics.get(name) {
            return Ok(topic.clone());
        }

        // Resolve settings before taking the map entry so a config error
        // surfaces without creating anything
        let settings = self.config.topic_settings(name)?;
        let topic = self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Topic::new(name, &settings)))
            .clone();
        Ok(topic)
    }

    /// Append a record to a topic, routed by key hash.
    ///
    /// Synchronous; never blocks on consumer progress. Errors only if
    /// the topic cannot be created.
    pub fn append(
        &self,
        topic: &str,
        key: Option<Bytes>,
        value: Bytes,
    ) -> Result<RecordMetadata> {
        Ok(self.topic(topic)?.append(key, value))
    }

    /// Subscribe a consumer, starting its consumption loop.
    ///
    /// The consumer names its own topic and group. Must be called from
    /// within a tokio runtime; the loop runs as a spawned task until the
    /// consumer is unsubscribed.
    pub fn subscribe(&self, consumer: Arc<dyn Consumer>) -> Result<()> {
        let topic = self.topic(consumer.topic())?;
        let settings = self.config.group_settings(consumer.group());
        let group = topic.consumer_group(consumer.group(), settings);
        group.subscribe(consumer)
    }

    /// Unsubscribe a consumer and stop its consumption loop.
    ///
    /// Idempotent: unknown consumers, groups, and topics are no-ops.
    /// Waits up to the group's stop timeout for the loop task to exit.
    pub async fn unsubscribe(&self, consumer: &Arc<dyn Consumer>) -> Result<()> {
        let Some(topic) = self.topics.get(consumer.topic()).map(|t| t.clone()) else {
            return Ok(());
        };
        let Some(group) = topic.existing_group(consumer.group()) else {
            return Ok(());
        };
        group.unsubscribe(consumer).await
    }

    /// Number of topics created so far
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopicSettings;
    use crate::error::BrokerError;

    #[test]
    fn test_topic_get_or_create_returns_same_instance() {
        let broker = Broker::in_memory();
        let first = broker.topic("orders").unwrap();
        let second = broker.topic("orders").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(broker.topic_count(), 1);
    }

    #[test]
    fn test_append_routes_by_key() {
        let config = BrokerConfig::new()
            .with_topic("orders", TopicSettings::default().with_partitions(2));
        let broker = Broker::new(config);

        let first = broker
            .append("orders", Some(Bytes::from("k1")), Bytes::from("v1"))
            .unwrap();
        let again = broker
            .append("orders", Some(Bytes::from("k1")), Bytes::from("v2"))
            .unwrap();
        assert_eq!(first.partition, again.partition);
        assert_eq!(again.offset, first.offset + 1);
    }

    #[test]
    fn test_unconfigured_topic_is_fatal_without_auto_create() {
        let broker = Broker::new(BrokerConfig::new().with_auto_create_topics(false));
        let err = broker
            .append("orders", None, Bytes::from("v"))
            .unwrap_err();
        assert!(matches!(err, BrokerError::TopicNotConfigured(_)));
        assert_eq!(broker.topic_count(), 0);
    }
}
