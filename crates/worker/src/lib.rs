//! The per-partition log-to-search indexing worker.
//!
//! Drives the fetch → transform → stage → post → commit round loop for one
//! partition, implementing the recovery policy and shutdown protocol; a
//! `PartitionSupervisor` owns one worker per configured partition.

pub mod config;
pub mod failed_events;
pub mod handler;
pub mod indexer;
pub mod supervisor;

pub use config::WorkerConfig;
pub use failed_events::FailedEventsLogger;
pub use handler::{MessageHandler, PassthroughHandler};
pub use indexer::IndexerWorker;
pub use supervisor::PartitionSupervisor;
