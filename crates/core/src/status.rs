//! Observable worker lifecycle state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Coarse execution phase of an indexing worker, observable by supervisors.
///
/// ```text
/// Created → Initialized → Started → InProgress ⇄ InProgress
///                                   ↓
///                            Stopped | Failed  (terminal)
/// ```
/// No transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Initialized,
    Started,
    InProgress,
    Stopped,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition per the state diagram.
    pub fn can_transition_to(self, next: Self) -> bool {
        use LifecycleState::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Created, Initialized)
                | (Initialized, Started)
                | (Started, InProgress)
                | (InProgress, InProgress)
                | (Started, Stopped)
                | (Started, Failed)
                | (InProgress, Stopped)
                | (InProgress, Failed)
                | (Initialized, Stopped)
                | (Initialized, Failed)
                | (Created, Stopped)
                | (Created, Failed)
        )
    }
}

/// A snapshot of a worker's lifecycle and offset progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobStatusSnapshot {
    pub last_committed_offset: i64,
    pub state: LifecycleState,
    pub partition: i32,
}

/// Mutable, concurrently-observable job status.
///
/// Guarded by a single lock so that readers always see `last_committed_offset`
/// and `state` as a consistent pair, never a torn update across two atomics.
pub struct JobStatus {
    partition: i32,
    inner: RwLock<Inner>,
}

struct Inner {
    last_committed_offset: i64,
    state: LifecycleState,
}

impl JobStatus {
    pub fn new(partition: i32) -> Self {
        Self {
            partition,
            inner: RwLock::new(Inner {
                last_committed_offset: -1,
                state: LifecycleState::Created,
            }),
        }
    }

    /// Returns a consistent snapshot of the current status.
    pub fn snapshot(&self) -> JobStatusSnapshot {
        let inner = self.inner.read();
        JobStatusSnapshot {
            last_committed_offset: inner.last_committed_offset,
            state: inner.state,
            partition: self.partition,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.read().state
    }

    /// Attempts the transition `current -> next`. Returns `false` (no-op) if
    /// the transition is illegal, in particular if the state is already
    /// terminal — terminal states never move again.
    pub fn transition_to(&self, next: LifecycleState) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.can_transition_to(next) {
            return false;
        }
        inner.state = next;
        true
    }

    /// Updates the committed offset. Does not change lifecycle state.
    pub fn set_last_committed_offset(&self, offset: i64) {
        self.inner.write().last_committed_offset = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_further_transitions() {
        let status = JobStatus::new(0);
        assert!(status.transition_to(LifecycleState::Initialized));
        assert!(status.transition_to(LifecycleState::Started));
        assert!(status.transition_to(LifecycleState::Failed));
        assert!(!status.transition_to(LifecycleState::InProgress));
        assert_eq!(status.state(), LifecycleState::Failed);
    }

    #[test]
    fn in_progress_self_loops() {
        let status = JobStatus::new(1);
        status.transition_to(LifecycleState::Initialized);
        status.transition_to(LifecycleState::Started);
        assert!(status.transition_to(LifecycleState::InProgress));
        assert!(status.transition_to(LifecycleState::InProgress));
    }

    #[test]
    fn snapshot_reflects_last_write() {
        let status = JobStatus::new(2);
        status.transition_to(LifecycleState::Initialized);
        status.set_last_committed_offset(110);
        let snap = status.snapshot();
        assert_eq!(snap.partition, 2);
        assert_eq!(snap.last_committed_offset, 110);
        assert_eq!(snap.state, LifecycleState::Initialized);
    }
}
