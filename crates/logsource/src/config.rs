//! Broker connection configuration.

use indexer_core::InitialOffsetPolicy;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize brokers as either a comma-separated string or a list.
fn deserialize_brokers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct BrokersVisitor;

    impl<'de> Visitor<'de> for BrokersVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a comma-separated string or a list of broker addresses")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split(',').map(|s| s.trim().to_string()).collect())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut brokers = Vec::new();
            while let Some(broker) = seq.next_element::<String>()? {
                brokers.push(broker);
            }
            Ok(brokers)
        }
    }

    deserializer.deserialize_any(BrokersVisitor)
}

/// Process-wide broker connection settings, shared by every partition
/// worker's `LogClient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker addresses (comma-separated string or list)
    #[serde(deserialize_with = "deserialize_brokers", default = "default_brokers")]
    pub brokers: Vec<String>,
    /// SASL username (for hosted/cloud brokers)
    pub sasl_username: Option<String>,
    /// SASL password (for hosted/cloud brokers)
    pub sasl_password: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Number of retries for transport-level broker calls
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Retry backoff in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    100
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            sasl_username: None,
            sasl_password: None,
            request_timeout_ms: default_request_timeout_ms(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl BrokerConfig {
    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }
}

/// Per-partition settings needed to construct a `KafkaLogClient` for one
/// partition worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Topic this worker subscribes to
    pub topic: String,
    /// Partition index (one worker per partition)
    pub partition: i32,
    /// Consumer group identity used when reading/writing committed offsets
    #[serde(default = "default_group_name")]
    pub consumer_group_name: String,
    /// Batch fetch timeout in milliseconds
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,
    /// Maximum bytes requested per fetch
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: i32,
    /// Where to start reading the first time this partition is seen
    #[serde(default)]
    pub initial_offset_policy: InitialOffsetPolicy,
}

fn default_group_name() -> String {
    "indexer-engine".to_string()
}

fn default_batch_timeout_ms() -> u64 {
    1000
}

fn default_max_fetch_bytes() -> i32 {
    1024 * 1024
}

impl PartitionConfig {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
            consumer_group_name: default_group_name(),
            batch_timeout_ms: default_batch_timeout_ms(),
            max_fetch_bytes: default_max_fetch_bytes(),
            initial_offset_policy: InitialOffsetPolicy::default(),
        }
    }
}
