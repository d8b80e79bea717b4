//! Owns one [`IndexerWorker`] task per configured partition and fans their
//! [`JobStatusSnapshot`]s in for the process's HTTP status surface (spec §6).

use crate::indexer::IndexerWorker;
use indexer_core::JobStatusSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

struct Handle {
    worker: Arc<IndexerWorker>,
    join: JoinHandle<JobStatusSnapshot>,
}

/// Spawns and supervises one worker task per partition.
pub struct PartitionSupervisor {
    handles: Vec<Handle>,
}

impl PartitionSupervisor {
    /// Spawns every worker in `workers` as its own `tokio` task.
    pub fn spawn(workers: Vec<Arc<IndexerWorker>>) -> Self {
        let handles = workers
            .into_iter()
            .map(|worker| {
                let task_worker = worker.clone();
                let join = tokio::spawn(async move { task_worker.run().await });
                Handle { worker, join }
            })
            .collect();

        Self { handles }
    }

    /// Status snapshots for every supervised partition, keyed by partition index.
    pub fn status_snapshots(&self) -> HashMap<i32, JobStatusSnapshot> {
        self.handles
            .iter()
            .map(|h| {
                let snap = h.worker.status();
                (snap.partition, snap)
            })
            .collect()
    }

    /// Cheap, clonable status handles for sharing with an HTTP surface
    /// independent of this supervisor's own lifecycle.
    pub fn status_handles(&self) -> Vec<Arc<IndexerWorker>> {
        self.handles.iter().map(|h| h.worker.clone()).collect()
    }

    /// Requests shutdown on every worker and waits for them all to exit.
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.worker.request_shutdown();
        }
        for handle in self.handles {
            let _ = handle.join.await;
        }
        info!("all partition workers stopped");
    }
}
