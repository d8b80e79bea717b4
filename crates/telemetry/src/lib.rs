//! Internal telemetry for the indexing engine: lock-free metrics, health
//! aggregation, and structured tracing setup.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
