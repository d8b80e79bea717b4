//! Structured logging for batch segments skipped due to a sink-data error.

use indexer_core::PartitionId;
use telemetry::metrics;
use tracing::warn;

/// Emits one structured log line per dropped batch-segment and increments
/// the matching counter metric (spec §6, observability).
#[derive(Debug, Default)]
pub struct FailedEventsLogger;

impl FailedEventsLogger {
    pub fn new() -> Self {
        Self
    }

    /// `offset_range` is `[start, end)`, matching [`indexer_core::IndexerError::SinkDataError`].
    pub fn log(&self, partition: &PartitionId, offset_range: (i64, i64), count: usize, message: &str) {
        warn!(
            topic = %partition.topic,
            partition = partition.partition,
            start_offset = offset_range.0,
            end_offset = offset_range.1,
            count,
            message,
            "dropping rejected batch segment"
        );
        metrics().sink_data_errors.inc_by(count as u64);
        metrics().records_skipped.inc_by(count as u64);
    }
}
