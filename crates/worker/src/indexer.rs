//! The per-partition indexing worker: the fetch → stage → post → commit
//! round loop and its recovery policy (spec §4.1–§4.3).

use crate::config::WorkerConfig;
use crate::failed_events::FailedEventsLogger;
use crate::handler::MessageHandler;
use indexer_core::{ErrorClass, IndexerError, JobStatus, JobStatusSnapshot, LifecycleState, PartitionId, Result};
use logsource::{FetchErrorCode, LogClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a single round, used only to decide whether to sleep before
/// the next iteration.
enum RoundOutcome {
    Continue,
    Reconnected,
}

/// Drives one partition's indexing round loop to completion.
pub struct IndexerWorker {
    partition: PartitionId,
    config: WorkerConfig,
    handler: Arc<dyn MessageHandler>,
    log_client: Arc<dyn LogClient>,
    failed_events: FailedEventsLogger,
    status: Arc<JobStatus>,
    shutdown_requested: AtomicBool,
    shutdown_notify: Notify,
    cancellation: CancellationToken,

    offset_for_this_round: std::sync::atomic::AtomicI64,
    next_offset_to_process: std::sync::atomic::AtomicI64,
    is_starting_first_time: AtomicBool,
}

impl IndexerWorker {
    /// Constructs a worker in state `Initialized`. Fails only if `config` is
    /// invalid.
    pub fn new(
        config: WorkerConfig,
        handler: Arc<dyn MessageHandler>,
        log_client: Arc<dyn LogClient>,
        cancellation: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let partition = PartitionId::new(config.topic.clone(), config.partition);
        let status = Arc::new(JobStatus::new(partition.partition));
        status.transition_to(LifecycleState::Initialized);

        Ok(Self {
            partition,
            config,
            handler,
            log_client,
            failed_events: FailedEventsLogger::new(),
            status,
            shutdown_requested: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
            cancellation,
            offset_for_this_round: std::sync::atomic::AtomicI64::new(0),
            next_offset_to_process: std::sync::atomic::AtomicI64::new(0),
            is_starting_first_time: AtomicBool::new(true),
        })
    }

    /// Returns a consistent snapshot of the worker's lifecycle state.
    pub fn status(&self) -> JobStatusSnapshot {
        self.status.snapshot()
    }

    /// A cheap clone of the status handle for supervisors to poll
    /// concurrently with the worker's own writes.
    pub fn status_handle(&self) -> Arc<JobStatus> {
        self.status.clone()
    }

    /// Requests the worker stop at the next round boundary. Idempotent,
    /// non-blocking.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_waiters();
    }

    /// Runs the round loop until a terminal state is reached.
    pub async fn run(&self) -> JobStatusSnapshot {
        self.status.transition_to(LifecycleState::Started);
        info!(
            topic = %self.partition.topic,
            partition = self.partition.partition,
            "indexer worker starting"
        );

        loop {
            if self.shutdown_requested.load(Ordering::SeqCst) {
                self.status.transition_to(LifecycleState::Stopped);
                break;
            }
            if self.cancellation.is_cancelled() {
                self.status.transition_to(LifecycleState::Stopped);
                break;
            }

            let round_start = Instant::now();
            match self.run_round().await {
                Ok(RoundOutcome::Continue) => {
                    if self.config.is_perf_reporting_enabled {
                        metrics().round_latency_ms.observe(round_start.elapsed().as_millis() as u64);
                    }
                    if !self.sleep_between_rounds().await {
                        self.status.transition_to(LifecycleState::Stopped);
                        break;
                    }
                }
                Ok(RoundOutcome::Reconnected) => {
                    // Reconnected after a recoverable error; re-enter the
                    // loop immediately at the same offset, no sleep.
                }
                Err(terminal) => {
                    warn!(
                        topic = %self.partition.topic,
                        partition = self.partition.partition,
                        error = %terminal,
                        "indexer worker terminating"
                    );
                    self.status.transition_to(LifecycleState::Failed);
                    break;
                }
            }
        }

        self.log_client.close().await;
        self.status.snapshot()
    }

    /// Sleeps for `sleepBetweenFetchesMs`, interruptible by shutdown.
    /// Returns `false` if shutdown fired during the sleep.
    async fn sleep_between_rounds(&self) -> bool {
        let sleep = tokio::time::sleep(Duration::from_millis(self.config.sleep_between_fetches_ms));
        tokio::select! {
            _ = sleep => !self.shutdown_requested.load(Ordering::SeqCst),
            _ = self.shutdown_notify.notified() => false,
            _ = self.cancellation.cancelled() => false,
        }
    }

    /// One fetch → stage → post → commit round. `Ok` means the loop should
    /// continue (possibly without sleeping, if a reconnect occurred); `Err`
    /// means the worker must terminate.
    async fn run_round(&self) -> std::result::Result<RoundOutcome, IndexerError> {
        self.determine_start_offset().await?;

        let offset_for_this_round = self.offset_for_this_round.load(Ordering::SeqCst);
        let fetch_start = Instant::now();
        let batch = match self.log_client.fetch(offset_for_this_round).await {
            Ok(batch) => batch,
            Err(e) => return self.handle_round_error(e).await,
        };
        if self.config.is_perf_reporting_enabled {
            metrics().fetch_latency_ms.observe(fetch_start.elapsed().as_millis() as u64);
        }

        if let Some(code) = batch.error_code {
            return self.handle_fetch_error_code(code, offset_for_this_round).await;
        }

        if batch.valid_bytes == 0 {
            return self.handle_empty_fetch(offset_for_this_round).await;
        }

        let proposed_next = match self
            .handler
            .prepare_for_post(&self.partition, batch.records)
            .await
        {
            Ok(next) => next,
            Err(e) => return self.handle_round_error(e).await,
        };

        if self.config.is_dry_run {
            debug!(
                topic = %self.partition.topic,
                partition = self.partition.partition,
                "dry run: skipping post and commit"
            );
            return Ok(RoundOutcome::Continue);
        }

        let post_start = Instant::now();
        match self.handler.post_to_sink().await {
            Ok(()) => {
                if self.config.is_perf_reporting_enabled {
                    metrics().post_latency_ms.observe(post_start.elapsed().as_millis() as u64);
                }
                metrics().bulk_submissions.inc();
                self.commit(proposed_next).await
            }
            Err(e) if e.classify() == ErrorClass::SinkDataError => {
                if let IndexerError::SinkDataError { start, end, count, message } = &e {
                    self.failed_events.log(&self.partition, (*start, *end), *count, message);
                }
                metrics().bulk_errors.inc();
                self.commit(proposed_next).await
            }
            Err(e) => self.handle_round_error(e).await,
        }
    }

    async fn determine_start_offset(&self) -> std::result::Result<(), IndexerError> {
        if self.is_starting_first_time.load(Ordering::SeqCst) {
            let initial = self.log_client.compute_initial_offset().await?;
            self.offset_for_this_round.store(initial, Ordering::SeqCst);
            self.next_offset_to_process.store(initial, Ordering::SeqCst);
            self.is_starting_first_time.store(false, Ordering::SeqCst);
        } else {
            let next = self.next_offset_to_process.load(Ordering::SeqCst);
            self.offset_for_this_round.store(next, Ordering::SeqCst);
        }

        let offset_for_this_round = self.offset_for_this_round.load(Ordering::SeqCst);
        self.status.set_last_committed_offset(offset_for_this_round);
        self.status.transition_to(LifecycleState::InProgress);
        Ok(())
    }

    async fn handle_fetch_error_code(
        &self,
        code: FetchErrorCode,
        offset_for_this_round: i64,
    ) -> std::result::Result<RoundOutcome, IndexerError> {
        match self.log_client.handle_fetch_error(code, offset_for_this_round).await {
            Ok(rebased) => {
                self.next_offset_to_process.store(rebased, Ordering::SeqCst);
                Ok(RoundOutcome::Continue)
            }
            Err(e) => self.handle_round_error(e).await,
        }
    }

    async fn handle_empty_fetch(
        &self,
        offset_for_this_round: i64,
    ) -> std::result::Result<RoundOutcome, IndexerError> {
        let latest = self.log_client.latest_offset().await?;
        if latest != offset_for_this_round {
            warn!(
                topic = %self.partition.topic,
                partition = self.partition.partition,
                offset_for_this_round,
                latest,
                "empty fetch but log has advanced past the fetched offset"
            );
        }
        Ok(RoundOutcome::Continue)
    }

    async fn commit(&self, next_offset: i64) -> std::result::Result<RoundOutcome, IndexerError> {
        match self.log_client.commit_offset(next_offset).await {
            Ok(()) => {
                self.next_offset_to_process.store(next_offset, Ordering::SeqCst);
                self.status.set_last_committed_offset(next_offset);
                metrics().records_indexed.inc_by((next_offset - self.offset_for_this_round.load(Ordering::SeqCst)).max(0) as u64);
                Ok(RoundOutcome::Continue)
            }
            Err(e) => {
                metrics().broker_commit_errors.inc();
                self.handle_round_error(e).await
            }
        }
    }

    /// Applies the recovery policy (spec §4.3) to a classified error.
    async fn handle_round_error(
        &self,
        error: IndexerError,
    ) -> std::result::Result<RoundOutcome, IndexerError> {
        match error.classify() {
            ErrorClass::SinkUnreachable => {
                // No commit, no reconnect: retry the same offset next round.
                Ok(RoundOutcome::Continue)
            }
            ErrorClass::SinkDataError => {
                // Reached only if a caller misclassifies; treat as recoverable.
                Ok(RoundOutcome::Continue)
            }
            ErrorClass::BrokerFatal => Err(error),
            ErrorClass::BrokerRecoverable => {
                metrics().broker_reconnect_attempts.inc();
                match self.log_client.reconnect().await {
                    Ok(()) => Ok(RoundOutcome::Reconnected),
                    Err(_) => Err(error),
                }
            }
        }
    }
}
