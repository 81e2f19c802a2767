//! Subtask records owned by a parent task.

use super::{ActorId, StatusCode, SubtaskId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A unit of work nested under a task.
///
/// Subtasks move through the same status catalog as tasks. Their statuses
/// feed the completion gate: a parent cannot complete successfully while a
/// subtask is still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    id: SubtaskId,
    parent: TaskId,
    title: String,
    status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<ActorId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Subtask {
    /// Creates a subtask in the given initial status (normally the catalog
    /// default).
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is empty
    /// after trimming.
    pub fn new(
        parent: TaskId,
        title: impl Into<String>,
        status: StatusCode,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let subtask_title = title.into();
        if subtask_title.trim().is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: SubtaskId::new(),
            parent,
            title: subtask_title,
            status,
            assignee: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Assigns the subtask to an actor.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubtaskId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn parent(&self) -> TaskId {
        self.parent
    }

    /// Returns the subtask title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status code.
    #[must_use]
    pub const fn status(&self) -> &StatusCode {
        &self.status
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<ActorId> {
        self.assignee
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn apply_status(&mut self, status: StatusCode, clock: &impl Clock) -> StatusCode {
        let old = std::mem::replace(&mut self.status, status);
        self.updated_at = clock.utc();
        old
    }
}
