//! Application state shared across handlers.

use indexer_worker::IndexerWorker;
use std::sync::Arc;

/// Shared application state: read-only access to every partition worker's
/// status handle, for the `/status` route.
#[derive(Clone)]
pub struct AppState {
    pub workers: Arc<Vec<Arc<IndexerWorker>>>,
}

impl AppState {
    pub fn new(workers: Vec<Arc<IndexerWorker>>) -> Self {
        Self {
            workers: Arc::new(workers),
        }
    }
}
