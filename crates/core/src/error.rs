//! Unified error type for the indexing worker and its collaborators.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, IndexerError>;

/// The four-way failure taxonomy the worker's recovery policy switches on.
///
/// Every [`IndexerError`] maps to exactly one class via [`IndexerError::classify`].
/// Cancellation is handled separately by the worker (it is a signal, not an
/// error the collaborators raise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient broker failure: attempt one reconnect, then fail.
    BrokerRecoverable,
    /// Non-recoverable broker failure: fail immediately.
    BrokerFatal,
    /// Search backend unreachable: retry the same offset, no reconnect.
    SinkUnreachable,
    /// Search backend rejected individual records: log, skip, and commit.
    SinkDataError,
}

/// Unified error type for the indexing worker and its collaborators.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("broker connection failed: {0}")]
    BrokerConnection(String),

    #[error("broker fetch failed at offset {offset}: {source}")]
    BrokerFetch { offset: i64, source: String },

    #[error("broker commit failed at offset {offset}: {source}")]
    BrokerCommit { offset: i64, source: String },

    #[error("broker reconnect failed: {0}")]
    BrokerReconnect(String),

    #[error("broker reported a fatal error: {0}")]
    BrokerFatal(String),

    #[error("search backend unreachable: {0}")]
    SinkUnreachable(String),

    #[error("search backend rejected {count} record(s) in range [{start}, {end}): {message}")]
    SinkDataError {
        start: i64,
        end: i64,
        count: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IndexerError {
    pub fn broker_connection(msg: impl Into<String>) -> Self {
        Self::BrokerConnection(msg.into())
    }

    pub fn broker_fetch(offset: i64, source: impl Into<String>) -> Self {
        Self::BrokerFetch {
            offset,
            source: source.into(),
        }
    }

    pub fn broker_commit(offset: i64, source: impl Into<String>) -> Self {
        Self::BrokerCommit {
            offset,
            source: source.into(),
        }
    }

    pub fn sink_unreachable(msg: impl Into<String>) -> Self {
        Self::SinkUnreachable(msg.into())
    }

    pub fn sink_data_error(start: i64, end: i64, count: usize, message: impl Into<String>) -> Self {
        Self::SinkDataError {
            start,
            end,
            count,
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classifies this error into one of the four recovery policy buckets.
    ///
    /// Anything not explicitly a broker-fatal, sink-unreachable, or
    /// sink-data error is treated as broker-recoverable — the worker never
    /// swallows an unclassified error, it just gives it the most
    /// conservative (retry-then-fail) treatment.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::SinkUnreachable(_) => ErrorClass::SinkUnreachable,
            Self::SinkDataError { .. } => ErrorClass::SinkDataError,
            Self::BrokerFatal(_) => ErrorClass::BrokerFatal,
            Self::BrokerConnection(_)
            | Self::BrokerFetch { .. }
            | Self::BrokerCommit { .. }
            | Self::BrokerReconnect(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Internal(_) => ErrorClass::BrokerRecoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_errors_classify_distinctly() {
        assert_eq!(
            IndexerError::sink_unreachable("refused").classify(),
            ErrorClass::SinkUnreachable
        );
        assert_eq!(
            IndexerError::sink_data_error(400, 410, 3, "rejected").classify(),
            ErrorClass::SinkDataError
        );
    }

    #[test]
    fn broker_fatal_does_not_retry() {
        assert_eq!(
            IndexerError::BrokerFatal("topic deleted".into()).classify(),
            ErrorClass::BrokerFatal
        );
    }

    #[test]
    fn unclassified_errors_default_to_broker_recoverable() {
        assert_eq!(
            IndexerError::internal("unexpected").classify(),
            ErrorClass::BrokerRecoverable
        );
        assert_eq!(
            IndexerError::config("bad value").classify(),
            ErrorClass::BrokerRecoverable
        );
    }
}
