//! Integration test for the health/status HTTP surface.

use api::{router, AppState};
use axum_test::TestServer;
use indexer_worker::{IndexerWorker, PassthroughHandler, WorkerConfig};
use integration_tests::mocks::{log_client_arc, MockSinkClient};
use searchsink::SinkClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn build_worker() -> Arc<IndexerWorker> {
    let log_client = log_client_arc(vec![], 0, 0);
    let sink: Arc<dyn SinkClient> = Arc::new(MockSinkClient::new());
    let handler = Arc::new(PassthroughHandler::new(sink));
    Arc::new(IndexerWorker::new(WorkerConfig::new("access-logs", 0), handler, log_client, CancellationToken::new()).unwrap())
}

#[tokio::test]
async fn status_endpoint_reports_every_worker() {
    let worker = build_worker();
    let state = AppState::new(vec![worker]);
    let server = TestServer::new(router(state)).unwrap();

    let response = server.get("/status").await;
    response.assert_status_ok();

    let body: Vec<indexer_core::JobStatusSnapshot> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].partition, 0);
}

#[tokio::test]
async fn liveness_probe_is_ok_before_any_health_report() {
    let worker = build_worker();
    let state = AppState::new(vec![worker]);
    let server = TestServer::new(router(state)).unwrap();

    let response = server.get("/health/live").await;
    response.assert_status_ok();
}
