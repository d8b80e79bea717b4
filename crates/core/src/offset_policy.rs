//! Initial offset selection policy.

use serde::{Deserialize, Serialize};

/// Where a worker starts reading from the first time it runs for a
/// partition (i.e. before any offset has ever been committed for its
/// consumer group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InitialOffsetPolicy {
    /// Start from the oldest retained record.
    Earliest,
    /// Start from the newest record (skip backlog).
    #[default]
    Latest,
    /// Resume from the consumer group's last committed offset, falling back
    /// to `Latest` if none exists yet.
    LastCommitted,
}
