//! Mock implementations of the worker's collaborator traits, for
//! cross-crate integration tests that don't need a real broker or sink.

use async_trait::async_trait;
use indexer_core::{PartitionId, Result};
use logsource::{BatchResponse, FetchErrorCode, LogClient, LogRecord};
use parking_lot::Mutex;
use searchsink::{BulkAction, BulkOutcome, SinkClient};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A `LogClient` backed by an in-memory record feed, with a fixed initial
/// offset and latest offset. Every fetch past the feed's end returns an
/// empty batch.
pub struct MockLogClient {
    records: Mutex<Vec<LogRecord>>,
    initial_offset: i64,
    latest: AtomicI64,
    committed: AtomicI64,
}

impl MockLogClient {
    pub fn new(records: Vec<LogRecord>, initial_offset: i64, latest: i64) -> Self {
        Self {
            records: Mutex::new(records),
            initial_offset,
            latest: AtomicI64::new(latest),
            committed: AtomicI64::new(-1),
        }
    }

    pub fn committed_offset(&self) -> i64 {
        self.committed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogClient for MockLogClient {
    async fn fetch(&self, offset: i64) -> Result<BatchResponse> {
        let records: Vec<_> = self
            .records
            .lock()
            .iter()
            .filter(|r| r.offset >= offset)
            .cloned()
            .collect();
        Ok(BatchResponse {
            error_code: None,
            valid_bytes: records.iter().map(|r| r.value.len()).sum(),
            records,
        })
    }

    async fn handle_fetch_error(&self, _code: FetchErrorCode, _offset: i64) -> Result<i64> {
        Ok(self.initial_offset)
    }

    async fn latest_offset(&self) -> Result<i64> {
        Ok(self.latest.load(Ordering::SeqCst))
    }

    async fn compute_initial_offset(&self) -> Result<i64> {
        Ok(self.initial_offset)
    }

    async fn commit_offset(&self, offset: i64) -> Result<()> {
        self.committed.store(offset, Ordering::SeqCst);
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

/// A `SinkClient` that accepts everything staged and records every
/// submitted action for inspection.
#[derive(Default)]
pub struct MockSinkClient {
    staged: Mutex<Vec<BulkAction>>,
    submitted: Mutex<Vec<BulkAction>>,
}

impl MockSinkClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted.lock().iter().map(|a| a.id.clone()).collect()
    }
}

#[async_trait]
impl SinkClient for MockSinkClient {
    fn stage(&self, action: BulkAction) {
        self.staged.lock().push(action);
    }

    async fn submit(&self) -> Result<BulkOutcome> {
        let staged = self.staged.lock().clone();
        let items = staged
            .iter()
            .map(|a| searchsink::BulkItemResult {
                id: a.id.clone(),
                accepted: true,
                error: None,
            })
            .collect();
        self.submitted.lock().extend(staged);
        Ok(BulkOutcome { items })
    }

    fn clear(&self) {
        self.staged.lock().clear();
    }

    fn staged_len(&self) -> usize {
        self.staged.lock().len()
    }
}

/// Builds a simple partition identity for tests.
pub fn test_partition() -> PartitionId {
    PartitionId::new("access-logs", 0)
}

pub fn log_client_arc(records: Vec<LogRecord>, initial_offset: i64, latest: i64) -> Arc<MockLogClient> {
    Arc::new(MockLogClient::new(records, initial_offset, latest))
}
