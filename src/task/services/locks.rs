//! Per-task mutual exclusion for mutating engine operations.
//!
//! Every mutating operation on a single task must be serialised: two
//! concurrent transition requests, or a transition racing an approval
//! decision, must not both read a stale snapshot and both commit. The lock
//! map hands out one async mutex per task id; callers hold the owned guard
//! across load, validate, mutate, update, and audit append.

use crate::task::domain::TaskId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-task mutexes keyed by task id.
///
/// Shared (via `Arc`) between every service that mutates tasks so the
/// critical sections compose across the transition resolver, the approval
/// engine, and the batch operator.
#[derive(Debug, Default)]
pub struct TaskLockMap {
    locks: Mutex<HashMap<TaskId, Arc<Mutex<()>>>>,
}

impl TaskLockMap {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the mutex for one task, creating it on first use.
    ///
    /// The returned guard keeps the task's critical section open until
    /// dropped. Callers that lock several tasks must acquire in ascending
    /// task-id order to avoid lock-ordering deadlocks.
    pub async fn acquire(&self, task_id: TaskId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(task_id).or_default())
        };
        lock.lock_owned().await
    }
}
