//! `SinkClient` contract and Elasticsearch-style bulk reference implementation.

pub mod client;
pub mod config;
pub mod health;
pub mod sink;

pub use client::EsSinkClient;
pub use config::SinkConfig;
pub use sink::{BulkAction, BulkItemResult, BulkOutcome, SinkClient};
