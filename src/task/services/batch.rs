//! Batch operator: one transition request applied across a set of tasks.
//!
//! All-or-nothing at validation time: every task is dry-run validated
//! first, and a single failure rejects the whole batch with every failure
//! reported together. The commit phase is a sequence of independent
//! single-task commits in ascending task-id order (stable lock order); a
//! commit-phase failure cannot be rolled back and is reported as
//! "N of M applied" in the outcome.

use mockable::Clock;

use crate::task::{
    domain::{Actor, StatusCode, TaskId},
    ports::{AuditSink, NotificationSink, TaskRepository},
};

use super::{EngineError, TransitionRequest, TransitionService};

/// Parameter object for a bulk transition request.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    task_ids: Vec<TaskId>,
    target: StatusCode,
    actor: Actor,
    reason: Option<String>,
}

impl BatchRequest {
    /// Creates a request with the required fields. Duplicate task ids are
    /// collapsed before validation.
    #[must_use]
    pub fn new(
        task_ids: impl IntoIterator<Item = TaskId>,
        target: StatusCode,
        actor: Actor,
    ) -> Self {
        Self {
            task_ids: task_ids.into_iter().collect(),
            target,
            actor,
            reason: None,
        }
    }

    /// Attaches a free-form reason recorded with every audit entry.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// One task's failure within a batch.
#[derive(Debug)]
pub struct BatchFailure {
    /// The failing task.
    pub task_id: TaskId,
    /// Why it failed.
    pub error: EngineError,
}

/// Result of a committed batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    applied: Vec<TaskId>,
    failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Returns the tasks whose transitions committed, in commit order.
    #[must_use]
    pub fn applied(&self) -> &[TaskId] {
        &self.applied
    }

    /// Returns commit-phase failures (validation passed but the commit
    /// itself failed, e.g. a concurrent modification).
    #[must_use]
    pub fn failures(&self) -> &[BatchFailure] {
        &self.failed
    }

    /// Returns true when every task in the batch committed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Batch operator service.
pub struct BatchService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    transitions: TransitionService<R, A, N, C>,
}

impl<R, A, N, C> Clone for BatchService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            transitions: self.transitions.clone(),
        }
    }
}

impl<R, A, N, C> BatchService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a batch service sharing the transition service's ports and
    /// lock map.
    #[must_use]
    pub const fn new(transitions: TransitionService<R, A, N, C>) -> Self {
        Self { transitions }
    }

    /// Applies one transition request to a set of tasks.
    ///
    /// Phase 1 validates every task without mutating (permission, catalog
    /// edge, completion gate); if any task fails, the whole batch is
    /// rejected and all failures are returned together so the caller can
    /// report them in one message. Phase 2 commits each task through the
    /// full single-task path (each with its own audit record) in
    /// ascending task-id order.
    ///
    /// # Errors
    ///
    /// Returns the complete list of validation failures when any task in
    /// the set fails validation. Commit-phase failures do not error; they
    /// are reported in the [`BatchOutcome`].
    pub async fn apply_to_many(
        &self,
        request: BatchRequest,
    ) -> Result<BatchOutcome, Vec<BatchFailure>> {
        let mut task_ids = request.task_ids.clone();
        task_ids.sort_unstable();
        task_ids.dedup();

        let mut failures = Vec::new();
        for task_id in &task_ids {
            let checked = match self.transitions.find_task(*task_id).await {
                Ok(task) => self
                    .transitions
                    .validate_transition(&task, &request.actor, &request.target),
                Err(err) => Err(err),
            };
            if let Err(error) = checked {
                failures.push(BatchFailure {
                    task_id: *task_id,
                    error,
                });
            }
        }
        if !failures.is_empty() {
            tracing::warn!(
                requested = task_ids.len(),
                failing = failures.len(),
                "batch rejected at validation"
            );
            return Err(failures);
        }

        let mut outcome = BatchOutcome::default();
        for task_id in task_ids {
            let mut transition =
                TransitionRequest::new(task_id, request.target.clone(), request.actor.clone());
            if let Some(reason) = &request.reason {
                transition = transition.with_reason(reason.clone());
            }
            match self.transitions.request_transition(transition).await {
                Ok(_) => outcome.applied.push(task_id),
                Err(error) => outcome.failed.push(BatchFailure { task_id, error }),
            }
        }
        tracing::info!(
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            "batch transition committed"
        );
        Ok(outcome)
    }
}
