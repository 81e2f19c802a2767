//! Audit record types for status changes.

use super::{ActorId, RecordId, StatusCode, SubtaskId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The record a status change was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeSubject {
    /// A task's own status changed.
    Task {
        /// The task.
        task: TaskId,
    },
    /// A subtask's status changed.
    Subtask {
        /// The owning task.
        task: TaskId,
        /// The subtask.
        subtask: SubtaskId,
    },
}

impl ChangeSubject {
    /// Returns the task the change belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Task { task } | Self::Subtask { task, .. } => *task,
        }
    }

    /// Returns the subtask, when the change targeted one.
    #[must_use]
    pub const fn subtask_id(&self) -> Option<SubtaskId> {
        match self {
            Self::Task { .. } => None,
            Self::Subtask { subtask, .. } => Some(*subtask),
        }
    }
}

/// Immutable record of one applied status change.
///
/// Records are append-only: the audit port exposes no update or delete, and
/// every status mutation on a task or subtask produces exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    /// Record identifier.
    pub id: RecordId,
    /// What changed.
    pub subject: ChangeSubject,
    /// Status before the change.
    pub old_status: StatusCode,
    /// Status after the change.
    pub new_status: StatusCode,
    /// Who requested the change.
    pub actor: ActorId,
    /// When the change was committed.
    pub recorded_at: DateTime<Utc>,
    /// Optional free-form reason supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusChangeRecord {
    /// Creates a record with a fresh identifier.
    #[must_use]
    pub fn new(
        subject: ChangeSubject,
        old_status: StatusCode,
        new_status: StatusCode,
        actor: ActorId,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            subject,
            old_status,
            new_status,
            actor,
            recorded_at,
            reason: None,
        }
    }

    /// Attaches a reason to the record.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
