//! The `SinkClient` contract consumed by the message handler (spec §4.6).

use async_trait::async_trait;
use indexer_core::Result;
use serde_json::Value;

/// One bulk action staged for submission.
#[derive(Debug, Clone)]
pub struct BulkAction {
    /// Identifier used as the bulk `_id`, typically derived from the
    /// record's partition/offset so re-indexing the same record is
    /// idempotent.
    pub id: String,
    pub document: Value,
}

/// Per-item result of a bulk submission.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    pub id: String,
    pub accepted: bool,
    pub error: Option<String>,
}

/// Result of a `submit()` call where the backend was reachable and replied.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub items: Vec<BulkItemResult>,
}

impl BulkOutcome {
    pub fn all_accepted(&self) -> bool {
        self.items.iter().all(|i| i.accepted)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|i| !i.accepted)
    }
}

/// Consumed interface to the search backend's bulk submission API (spec §4.4, §4.6).
#[async_trait]
pub trait SinkClient: Send + Sync {
    /// Appends one action to the in-progress bulk request body.
    fn stage(&self, action: BulkAction);

    /// Submits the staged bulk request and waits for the response.
    ///
    /// A transport-level failure (connection refused, timeout, 5xx) must be
    /// surfaced as [`indexer_core::IndexerError::SinkUnreachable`]; a 2xx
    /// response carrying per-item errors is returned as `Ok` with those
    /// items marked unaccepted in the [`BulkOutcome`] (the caller maps that
    /// to `SinkDataError`).
    async fn submit(&self) -> Result<BulkOutcome>;

    /// Empties the staged buffer. Always called by the caller after
    /// `submit()`, regardless of outcome.
    fn clear(&self);

    /// Number of actions currently staged.
    fn staged_len(&self) -> usize;
}
