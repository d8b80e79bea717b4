//! `MessageHandler` contract (spec §4.4) and a trivial reference implementation.

use async_trait::async_trait;
use indexer_core::{IndexerError, PartitionId, Result};
use logsource::LogRecord;
use parking_lot::Mutex;
use searchsink::{BulkAction, SinkClient};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Transforms raw byte records into sink-ready documents and drives the
/// staged bulk request's post lifecycle.
///
/// Implementations own the staged bulk buffer; it may not be shared across
/// partitions unless the handler is explicitly partition-keyed.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Drains `records`, staging each transformed document, and returns the
    /// offset immediately past the last record in the batch. Individual
    /// transform failures are logged and skipped — they never raise.
    async fn prepare_for_post(&self, partition: &PartitionId, records: Vec<LogRecord>) -> Result<i64>;

    /// Submits the staged bulk request. Raises `SinkUnreachable` on
    /// transport failure or `SinkDataError` when the backend rejects
    /// individual records. Clears the staged buffer in both the success
    /// and the raise path.
    async fn post_to_sink(&self) -> Result<()>;
}

/// Reference [`MessageHandler`]: deserializes each record as JSON into a
/// generic sink document (`_id = "{topic}-{partition}-{offset}"`) and posts
/// it via a [`SinkClient`]. Production deployments are expected to supply
/// their own handler.
pub struct PassthroughHandler {
    sink: Arc<dyn SinkClient>,
    staged_offsets: Mutex<Vec<i64>>,
}

impl PassthroughHandler {
    pub fn new(sink: Arc<dyn SinkClient>) -> Self {
        Self {
            sink,
            staged_offsets: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MessageHandler for PassthroughHandler {
    async fn prepare_for_post(&self, partition: &PartitionId, records: Vec<LogRecord>) -> Result<i64> {
        let mut staged = self.staged_offsets.lock();
        staged.clear();

        let mut proposed_next = None;
        for record in records {
            let offset = record.offset;
            match serde_json::from_slice::<Value>(&record.value) {
                Ok(document) => {
                    let id = format!("{}-{}-{}", partition.topic, partition.partition, offset);
                    self.sink.stage(BulkAction { id, document });
                    staged.push(offset);
                }
                Err(e) => {
                    warn!(
                        topic = %partition.topic,
                        partition = partition.partition,
                        offset,
                        error = %e,
                        "skipping malformed record"
                    );
                }
            }
            proposed_next = Some(offset + 1);
        }

        proposed_next
            .ok_or_else(|| IndexerError::internal("prepare_for_post called with an empty batch"))
    }

    async fn post_to_sink(&self) -> Result<()> {
        let offsets = self.staged_offsets.lock().clone();
        let result = self.sink.submit().await;
        self.sink.clear();
        self.staged_offsets.lock().clear();

        let outcome = result?;
        if outcome.all_accepted() {
            return Ok(());
        }

        let rejected: Vec<_> = outcome.rejected().collect();
        let count = rejected.len();
        let start = offsets.iter().min().copied().unwrap_or(0);
        let end = offsets.iter().max().map(|o| o + 1).unwrap_or(0);
        let message = rejected
            .iter()
            .filter_map(|r| r.error.clone())
            .collect::<Vec<_>>()
            .join("; ");

        Err(IndexerError::sink_data_error(start, end, count, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchsink::BulkOutcome;

    struct StubSink {
        accept: bool,
    }

    #[async_trait]
    impl SinkClient for StubSink {
        fn stage(&self, _action: BulkAction) {}

        async fn submit(&self) -> Result<BulkOutcome> {
            if self.accept {
                Ok(BulkOutcome {
                    items: vec![searchsink::BulkItemResult {
                        id: "t-0-1".to_string(),
                        accepted: true,
                        error: None,
                    }],
                })
            } else {
                Ok(BulkOutcome {
                    items: vec![searchsink::BulkItemResult {
                        id: "t-0-1".to_string(),
                        accepted: false,
                        error: Some("mapper_parsing_exception".to_string()),
                    }],
                })
            }
        }

        fn clear(&self) {}

        fn staged_len(&self) -> usize {
            0
        }
    }

    fn partition() -> PartitionId {
        PartitionId::new("access-logs", 0)
    }

    #[tokio::test]
    async fn prepare_for_post_skips_malformed_records_but_advances() {
        let handler = PassthroughHandler::new(Arc::new(StubSink { accept: true }));
        let records = vec![
            LogRecord { offset: 10, value: br#"{"a":1}"#.to_vec() },
            LogRecord { offset: 11, value: b"not json".to_vec() },
        ];
        let next = handler
            .prepare_for_post(&partition(), records)
            .await
            .unwrap();
        assert_eq!(next, 12);
    }

    #[tokio::test]
    async fn post_to_sink_surfaces_sink_data_error_on_rejection() {
        let handler = PassthroughHandler::new(Arc::new(StubSink { accept: false }));
        handler
            .prepare_for_post(
                &partition(),
                vec![LogRecord { offset: 1, value: br#"{"a":1}"#.to_vec() }],
            )
            .await
            .unwrap();

        let err = handler.post_to_sink().await.unwrap_err();
        assert_eq!(err.classify(), indexer_core::ErrorClass::SinkDataError);
    }
}
