//! Error types for task domain construction and validation.

use super::SubtaskId;
use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task or subtask title is empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,

    /// The status code is empty or contains whitespace.
    #[error("invalid status code '{0}'")]
    InvalidStatusCode(String),

    /// An approval task was configured without any approvers.
    #[error("an approval task requires at least one approver")]
    EmptyApproverRoster,

    /// The referenced subtask does not belong to the task.
    #[error("unknown subtask: {0}")]
    UnknownSubtask(SubtaskId),
}
