//! Cross-crate check that the supervisor correctly drives multiple
//! partition workers end to end with the worker crate's reference handler.

use indexer_core::LifecycleState;
use indexer_worker::{IndexerWorker, PartitionSupervisor, PassthroughHandler, WorkerConfig};
use integration_tests::mocks::{log_client_arc, MockSinkClient};
use logsource::LogRecord;
use searchsink::SinkClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn worker_config(topic: &str, partition: i32) -> WorkerConfig {
    let mut cfg = WorkerConfig::new(topic, partition);
    cfg.sleep_between_fetches_ms = 5;
    cfg
}

#[tokio::test]
async fn supervisor_runs_two_partitions_independently_and_reports_status() {
    let records_p0 = vec![LogRecord { offset: 0, value: br#"{"path":"/a"}"#.to_vec() }];
    let records_p1 = vec![LogRecord { offset: 10, value: br#"{"path":"/b"}"#.to_vec() }];

    let log_client_0 = log_client_arc(records_p0, 0, 1);
    let log_client_1 = log_client_arc(records_p1, 10, 11);

    let sink_0: Arc<dyn SinkClient> = Arc::new(MockSinkClient::new());
    let sink_1: Arc<dyn SinkClient> = Arc::new(MockSinkClient::new());
    let handler_0 = Arc::new(PassthroughHandler::new(sink_0));
    let handler_1 = Arc::new(PassthroughHandler::new(sink_1));

    let worker_0 = Arc::new(
        IndexerWorker::new(worker_config("access-logs", 0), handler_0, log_client_0.clone(), CancellationToken::new())
            .unwrap(),
    );
    let worker_1 = Arc::new(
        IndexerWorker::new(worker_config("access-logs", 1), handler_1, log_client_1.clone(), CancellationToken::new())
            .unwrap(),
    );

    let supervisor = PartitionSupervisor::spawn(vec![worker_0, worker_1]);

    // Give both workers time to run at least one round.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshots = supervisor.status_snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[&0].state, LifecycleState::InProgress);
    assert_eq!(snapshots[&1].state, LifecycleState::InProgress);

    assert_eq!(log_client_0.committed_offset(), 1);
    assert_eq!(log_client_1.committed_offset(), 11);

    supervisor.shutdown().await;
}
