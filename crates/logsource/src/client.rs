//! The `LogClient` contract consumed by the indexing worker (spec §4.5).

use async_trait::async_trait;
use indexer_core::Result;

/// One record as read off the log, before any transformation.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub offset: i64,
    pub value: Vec<u8>,
}

/// Broker-reported error classes a fetch can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    /// The requested offset is no longer (or not yet) valid for this partition.
    OffsetOutOfRange,
    /// This broker is no longer the partition leader; caller should reconnect.
    NotLeaderForPartition,
    /// Some other broker-reported condition.
    Other,
}

/// Result of one `fetch` call.
#[derive(Debug, Clone, Default)]
pub struct BatchResponse {
    pub error_code: Option<FetchErrorCode>,
    pub records: Vec<LogRecord>,
    pub valid_bytes: usize,
}

/// Consumed interface to the log broker (spec §4.5).
///
/// Implementations own connection lifecycle, classify their own broker
/// errors, and are responsible for everything below the offset/byte
/// contract the worker drives — the worker never touches a socket.
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Fetches a batch of records starting at `offset`.
    async fn fetch(&self, offset: i64) -> Result<BatchResponse>;

    /// Given a broker error code encountered for `offset`, returns a rebased
    /// offset to resume from (e.g. reset to earliest/latest on
    /// `OffsetOutOfRange`), or an error if the condition is not recoverable
    /// by rebasing.
    async fn handle_fetch_error(&self, code: FetchErrorCode, offset: i64) -> Result<i64>;

    /// The partition's current high-water mark.
    async fn latest_offset(&self) -> Result<i64>;

    /// The offset a first-time worker should start reading from, per the
    /// configured [`indexer_core::InitialOffsetPolicy`].
    async fn compute_initial_offset(&self) -> Result<i64>;

    /// Persists `offset` as the consumer group's committed position.
    async fn commit_offset(&self, offset: i64) -> Result<()>;

    /// Re-establishes the broker session after a recoverable failure.
    async fn reconnect(&self) -> Result<()>;

    /// Releases held connections. Must be safe to call more than once.
    async fn close(&self);
}
