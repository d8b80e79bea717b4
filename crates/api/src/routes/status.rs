//! Per-partition status endpoint.

use axum::{extract::State, Json};
use indexer_core::JobStatusSnapshot;

use crate::state::AppState;

/// GET /status - every supervised partition's `JobStatus` snapshot.
pub async fn status_handler(State(state): State<AppState>) -> Json<Vec<JobStatusSnapshot>> {
    let snapshots = state.workers.iter().map(|w| w.status()).collect();
    Json(snapshots)
}
