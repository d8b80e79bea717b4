//! Broker health checks.

use crate::config::BrokerConfig;
use rskafka::client::ClientBuilder;
use tracing::{debug, error};

/// Check broker connectivity independent of any single partition client.
pub async fn check_connection(config: &BrokerConfig) -> bool {
    let connection = config.broker_string();

    match ClientBuilder::new(vec![connection]).build().await {
        Ok(client) => match client.list_topics().await {
            Ok(topics) => {
                debug!(topics = topics.len(), "broker connection healthy");
                true
            }
            Err(e) => {
                error!("failed to list broker topics: {}", e);
                false
            }
        },
        Err(e) => {
            error!("failed to connect to broker: {}", e);
            false
        }
    }
}

/// Returns the subset of `topics` that do not currently exist on the broker.
pub async fn missing_topics(config: &BrokerConfig, topics: &[&str]) -> Vec<String> {
    let connection = config.broker_string();

    match ClientBuilder::new(vec![connection]).build().await {
        Ok(client) => match client.list_topics().await {
            Ok(existing_topics) => {
                let existing: std::collections::HashSet<_> =
                    existing_topics.iter().map(|t| t.name.as_str()).collect();

                topics
                    .iter()
                    .filter(|t| !existing.contains(*t))
                    .map(|t| t.to_string())
                    .collect()
            }
            Err(_) => topics.iter().map(|t| t.to_string()).collect(),
        },
        Err(_) => topics.iter().map(|t| t.to_string()).collect(),
    }
}
