//! Per-partition round-loop configuration (spec §6).

use indexer_core::{IndexerError, InitialOffsetPolicy, Result};
use serde::{Deserialize, Serialize};

/// Configuration for one [`crate::indexer::IndexerWorker`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub topic: String,
    pub partition: i32,
    #[serde(default = "default_consumer_group_name")]
    pub consumer_group_name: String,
    #[serde(default = "default_sleep_ms")]
    pub sleep_between_fetches_ms: u64,
    #[serde(default)]
    pub is_dry_run: bool,
    #[serde(default)]
    pub is_perf_reporting_enabled: bool,
    #[serde(default)]
    pub initial_offset_policy: InitialOffsetPolicy,
}

fn default_consumer_group_name() -> String {
    "indexer-engine".to_string()
}

fn default_sleep_ms() -> u64 {
    1000
}

impl WorkerConfig {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
            consumer_group_name: default_consumer_group_name(),
            sleep_between_fetches_ms: default_sleep_ms(),
            is_dry_run: false,
            is_perf_reporting_enabled: false,
            initial_offset_policy: InitialOffsetPolicy::default(),
        }
    }

    /// Validates the configuration, failing construction the way the
    /// worker's constructor contract requires (spec §4.1).
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(IndexerError::config("topic must not be empty"));
        }
        if self.partition < 0 {
            return Err(IndexerError::config("partition must be non-negative"));
        }
        if self.sleep_between_fetches_ms == 0 {
            return Err(IndexerError::config(
                "sleep_between_fetches_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_topic_is_rejected() {
        let cfg = WorkerConfig::new("", 0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = WorkerConfig::new("access-logs", 0);
        assert!(cfg.validate().is_ok());
    }
}
