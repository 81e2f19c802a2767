//! Task aggregate root and construction parameters.

use super::{
    ActorId, ApprovalSetup, ApprovalState, StatusCatalog, StatusCode, Subtask, SubtaskId,
    TaskDomainError, TaskId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Discriminates regular tasks from approval tasks.
///
/// Approval-specific state exists only on the `Approval` variant, so a
/// regular task cannot half-carry approver fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Task completed by direct status edits.
    Regular,
    /// Task completed by an approver vote.
    Approval(ApprovalState),
}

/// Parameter object for creating a task.
///
/// # Examples
///
/// ```
/// use quorum::task::domain::{Actor, ActorRole, NewTaskParams};
///
/// let creator = Actor::new(ActorRole::Member);
/// let params = NewTaskParams::new("Ship the release", creator.id())
///     .with_assignee(creator.id());
/// ```
#[derive(Debug, Clone)]
pub struct NewTaskParams {
    title: String,
    creator: ActorId,
    assignee: Option<ActorId>,
    collaborators: BTreeSet<ActorId>,
    due_at: Option<DateTime<Utc>>,
    approval: Option<ApprovalSetup>,
}

impl NewTaskParams {
    /// Creates parameters with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, creator: ActorId) -> Self {
        Self {
            title: title.into(),
            creator,
            assignee: None,
            collaborators: BTreeSet::new(),
            due_at: None,
            approval: None,
        }
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Adds collaborators.
    #[must_use]
    pub fn with_collaborators(mut self, collaborators: impl IntoIterator<Item = ActorId>) -> Self {
        self.collaborators.extend(collaborators);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Configures the task as an approval task.
    #[must_use]
    pub fn with_approval(mut self, setup: ApprovalSetup) -> Self {
        self.approval = Some(setup);
        self
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted status code.
    pub status: StatusCode,
    /// Persisted creator.
    pub creator: ActorId,
    /// Persisted assignee, if any.
    pub assignee: Option<ActorId>,
    /// Persisted collaborator set.
    pub collaborators: BTreeSet<ActorId>,
    /// Persisted subtasks in creation order.
    pub subtasks: Vec<Subtask>,
    /// Persisted task kind (regular or approval with state).
    pub kind: TaskKind,
    /// Persisted due date, if any.
    pub due_at: Option<DateTime<Utc>>,
    /// Persisted optimistic-concurrency token.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task aggregate root.
///
/// A task owns its subtasks and (for approval tasks) its approval state;
/// no other entity mutates them directly. Status mutation is crate-private:
/// callers change status only through the engine services, which enforce
/// catalog edges, permissions, and the completion gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    status: StatusCode,
    creator: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<ActorId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    collaborators: BTreeSet<ActorId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subtasks: Vec<Subtask>,
    kind: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in the catalog's default status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is empty
    /// after trimming, or [`TaskDomainError::EmptyApproverRoster`] when an
    /// approval setup holds no approvers.
    pub fn new(
        params: NewTaskParams,
        catalog: &StatusCatalog,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        if params.title.trim().is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let kind = match params.approval {
            Some(setup) => TaskKind::Approval(ApprovalState::from_setup(setup)?),
            None => TaskKind::Regular,
        };
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title: params.title,
            status: catalog.default_code().clone(),
            creator: params.creator,
            assignee: params.assignee,
            collaborators: params.collaborators,
            subtasks: Vec::new(),
            kind,
            due_at: params.due_at,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            status: data.status,
            creator: data.creator,
            assignee: data.assignee,
            collaborators: data.collaborators,
            subtasks: data.subtasks,
            kind: data.kind,
            due_at: data.due_at,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status code.
    #[must_use]
    pub const fn status(&self) -> &StatusCode {
        &self.status
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator(&self) -> ActorId {
        self.creator
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<ActorId> {
        self.assignee
    }

    /// Returns the collaborator set.
    #[must_use]
    pub const fn collaborators(&self) -> &BTreeSet<ActorId> {
        &self.collaborators
    }

    /// Returns the subtasks in creation order.
    #[must_use]
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Looks up a subtask by identifier.
    #[must_use]
    pub fn subtask(&self, subtask_id: SubtaskId) -> Option<&Subtask> {
        self.subtasks
            .iter()
            .find(|subtask| subtask.id() == subtask_id)
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Returns the approval state for approval tasks.
    #[must_use]
    pub const fn approval_state(&self) -> Option<&ApprovalState> {
        match &self.kind {
            TaskKind::Approval(state) => Some(state),
            TaskKind::Regular => None,
        }
    }

    /// Returns true for approval tasks.
    #[must_use]
    pub const fn is_approval_task(&self) -> bool {
        matches!(self.kind, TaskKind::Approval(_))
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    /// Returns the optimistic-concurrency token. Repositories bump it on
    /// every successful update.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
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

    /// Appends a subtask to the aggregate.
    pub fn add_subtask(&mut self, subtask: Subtask, clock: &impl Clock) {
        self.subtasks.push(subtask);
        self.touch(clock);
    }

    /// Removes a subtask from the aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownSubtask`] when the subtask does
    /// not belong to this task.
    pub fn remove_subtask(
        &mut self,
        subtask_id: SubtaskId,
        clock: &impl Clock,
    ) -> Result<Subtask, TaskDomainError> {
        let position = self
            .subtasks
            .iter()
            .position(|subtask| subtask.id() == subtask_id)
            .ok_or(TaskDomainError::UnknownSubtask(subtask_id))?;
        let removed = self.subtasks.remove(position);
        self.touch(clock);
        Ok(removed)
    }

    pub(crate) fn apply_status(&mut self, status: StatusCode, clock: &impl Clock) -> StatusCode {
        let old = std::mem::replace(&mut self.status, status);
        self.touch(clock);
        old
    }

    pub(crate) fn apply_subtask_status(
        &mut self,
        subtask_id: SubtaskId,
        status: StatusCode,
        clock: &impl Clock,
    ) -> Result<StatusCode, TaskDomainError> {
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|candidate| candidate.id() == subtask_id)
            .ok_or(TaskDomainError::UnknownSubtask(subtask_id))?;
        let old = subtask.apply_status(status, clock);
        self.touch(clock);
        Ok(old)
    }

    pub(crate) const fn approval_state_mut(&mut self) -> Option<&mut ApprovalState> {
        match &mut self.kind {
            TaskKind::Approval(state) => Some(state),
            TaskKind::Regular => None,
        }
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
