//! Caller-facing error taxonomy for engine operations.

use crate::task::domain::{ActorId, ApprovalError, FinalKind, TaskDomainError, TaskId};
use crate::task::ports::{AuditSinkError, TaskRepositoryError};
use thiserror::Error;

/// Result type for engine service operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by the transition resolver, approval engine, and batch
/// operator.
///
/// Validation errors (`PermissionDenied`, `InvalidTransition`,
/// `IncompleteSubtasks`, the approval preconditions) represent a caller or
/// permission mistake and must not be retried automatically.
/// [`EngineError::ConcurrentModification`] is safe to retry after reloading
/// the task and recomputing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The actor may not perform this operation on the task.
    #[error("actor {actor} is not permitted to modify this task")]
    PermissionDenied {
        /// The rejected actor.
        actor: ActorId,
    },

    /// The catalog does not allow this edge. Labels name the current and
    /// requested statuses so a caller can self-correct.
    #[error("cannot transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// Label of the current status.
        from: String,
        /// Label of the requested status.
        to: String,
    },

    /// The target is success-final but subtasks are still in flight.
    #[error("{blocking} subtask(s) must be completed or cancelled first")]
    IncompleteSubtasks {
        /// Number of subtasks blocking completion.
        blocking: usize,
    },

    /// An approval precondition failed.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// An approval operation addressed a task that is not an approval task.
    #[error("task {0} is not configured for approval")]
    NotApprovalTask(TaskId),

    /// The loaded task was stale versus the repository. Reload and retry.
    #[error("task {0} was modified concurrently; reload and retry")]
    ConcurrentModification(TaskId),

    /// The catalog defines no active terminal status of the required kind,
    /// so a consensus outcome has no transition target.
    #[error("the status catalog defines no active {0} status")]
    MissingFinalStatus(FinalKind),

    /// Auto-approval was invoked before the configured window elapsed (or
    /// the task has no auto-approval configuration or due date).
    #[error("auto-approval is not configured or not yet due for task {0}")]
    AutoApprovalNotDue(TaskId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),

    /// Audit append failed.
    #[error(transparent)]
    Audit(#[from] AuditSinkError),
}

impl From<TaskRepositoryError> for EngineError {
    /// Maps repository failures onto the caller-facing taxonomy:
    /// `NotFound` becomes [`EngineError::TaskNotFound`] and
    /// `VersionConflict` becomes [`EngineError::ConcurrentModification`].
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskRepositoryError::VersionConflict(task_id) => Self::ConcurrentModification(task_id),
            other => Self::Repository(other),
        }
    }
}
