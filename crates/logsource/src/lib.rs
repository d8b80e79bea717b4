//! `LogClient` contract and Kafka-compatible reference implementation.

pub mod client;
pub mod config;
pub mod health;
pub mod kafka;

pub use client::{BatchResponse, FetchErrorCode, LogClient, LogRecord};
pub use config::{BrokerConfig, PartitionConfig};
pub use kafka::KafkaLogClient;
