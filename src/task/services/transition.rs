//! Transition resolver: the guarded path for every status change.
//!
//! Combines the status catalog, the permission guard, and the completion
//! gate to compute legal transitions and to validate and commit requested
//! ones. Commits run inside the task's critical section; the audit append
//! is the last step before the lock is released.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;

use crate::task::{
    domain::{
        Actor, ActorId, ChangeSubject, NewTaskParams, Outcome, StatusCatalog, StatusChangeRecord,
        StatusCode, Subtask, SubtaskId, Task, TaskDomainError, TaskEvent, TaskId, gate, guard,
    },
    ports::{AuditSink, NotificationSink, TaskRepository},
};

use super::{EngineError, EngineResult, TaskLockMap};

/// Parameter object for a single-task transition request.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    task_id: TaskId,
    target: StatusCode,
    actor: Actor,
    reason: Option<String>,
    require_confirmation: bool,
}

impl TransitionRequest {
    /// Creates a request with the required fields. Confirmation is not
    /// required by default; interactive callers opt in for terminal
    /// targets via [`Self::requiring_confirmation`].
    #[must_use]
    pub const fn new(task_id: TaskId, target: StatusCode, actor: Actor) -> Self {
        Self {
            task_id,
            target,
            actor,
            reason: None,
            require_confirmation: false,
        }
    }

    /// Attaches a free-form reason recorded with the audit entry.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Requests the two-phase confirmation flow: a terminal target returns
    /// [`Outcome::NeedsConfirmation`] without mutating state, and the
    /// caller re-invokes without this flag to commit.
    #[must_use]
    pub const fn requiring_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Returns the addressed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the requested target status.
    #[must_use]
    pub const fn target(&self) -> &StatusCode {
        &self.target
    }
}

/// Parameter object for a subtask transition request.
#[derive(Debug, Clone)]
pub struct SubtaskTransitionRequest {
    task_id: TaskId,
    subtask_id: SubtaskId,
    target: StatusCode,
    actor: Actor,
    reason: Option<String>,
}

impl SubtaskTransitionRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub const fn new(
        task_id: TaskId,
        subtask_id: SubtaskId,
        target: StatusCode,
        actor: Actor,
    ) -> Self {
        Self {
            task_id,
            subtask_id,
            target,
            actor,
            reason: None,
        }
    }

    /// Attaches a free-form reason recorded with the audit entry.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Transition resolver service.
///
/// Generic over the repository, audit sink, notification sink, and clock
/// ports so tests can substitute deterministic implementations.
pub struct TransitionService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    catalog: Arc<StatusCatalog>,
    repository: Arc<R>,
    audit: Arc<A>,
    notifications: Arc<N>,
    clock: Arc<C>,
    locks: Arc<TaskLockMap>,
}

impl<R, A, N, C> Clone for TransitionService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            repository: Arc::clone(&self.repository),
            audit: Arc::clone(&self.audit),
            notifications: Arc::clone(&self.notifications),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<R, A, N, C> TransitionService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a new transition service.
    ///
    /// The lock map must be shared with every other service mutating the
    /// same repository so per-task critical sections compose.
    #[must_use]
    pub const fn new(
        catalog: Arc<StatusCatalog>,
        repository: Arc<R>,
        audit: Arc<A>,
        notifications: Arc<N>,
        clock: Arc<C>,
        locks: Arc<TaskLockMap>,
    ) -> Self {
        Self {
            catalog,
            repository,
            audit,
            notifications,
            clock,
            locks,
        }
    }

    /// Returns the catalog this resolver validates against.
    #[must_use]
    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    pub(crate) const fn locks(&self) -> &Arc<TaskLockMap> {
        &self.locks
    }

    pub(crate) const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Computes the legal next statuses for a task and actor.
    ///
    /// Advisory for UI rendering: the set is the catalog's targets minus
    /// success-final statuses blocked by the completion gate, or empty when
    /// the actor lacks permission. `request_transition` re-checks
    /// authoritatively at commit time.
    #[must_use]
    pub fn compute_valid_transitions(&self, task: &Task, actor: &Actor) -> BTreeSet<StatusCode> {
        if !guard::can_change_status(task, actor) {
            return BTreeSet::new();
        }
        self.catalog
            .valid_targets(task.status())
            .into_iter()
            .filter(|target| gate::can_enter_final(&self.catalog, task, target))
            .collect()
    }

    /// Validates one transition without mutating state (steps 2–4 of the
    /// commit path: permission, catalog edge, completion gate).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PermissionDenied`],
    /// [`EngineError::InvalidTransition`] (naming both status labels), or
    /// [`EngineError::IncompleteSubtasks`] with the blocking count.
    pub fn validate_transition(
        &self,
        task: &Task,
        actor: &Actor,
        target: &StatusCode,
    ) -> EngineResult<()> {
        if !guard::can_change_status(task, actor) {
            return Err(EngineError::PermissionDenied { actor: actor.id() });
        }
        if !self.catalog.valid_targets(task.status()).contains(target) {
            return Err(EngineError::InvalidTransition {
                from: self.catalog.label_of(task.status()),
                to: self.catalog.label_of(target),
            });
        }
        if self.catalog.is_success_final(target) {
            let blocking = gate::blocking_subtasks(&self.catalog, task);
            if blocking > 0 {
                return Err(EngineError::IncompleteSubtasks { blocking });
            }
        }
        Ok(())
    }

    /// Creates a task in the catalog's default status and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Domain`] for invalid parameters or a
    /// repository error when the store rejects the task.
    pub async fn create_task(&self, params: NewTaskParams) -> EngineResult<Task> {
        let task = Task::new(params, &self.catalog, &*self.clock)?;
        self.repository.store(&task).await?;
        tracing::info!(task_id = %task.id(), status = %task.status(), "task created");
        Ok(task)
    }

    /// Adds a subtask (in the catalog's default status) to a task.
    ///
    /// Guarded like a status change: only the creator, assignee,
    /// collaborators, or an admin may extend a task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`],
    /// [`EngineError::PermissionDenied`], or [`EngineError::Domain`] for an
    /// empty title.
    pub async fn add_subtask(
        &self,
        task_id: TaskId,
        title: impl Into<String> + Send,
        actor: &Actor,
    ) -> EngineResult<Subtask> {
        let _guard = self.locks.acquire(task_id).await;
        let mut task = self.load_required(task_id).await?;
        if !guard::can_change_status(&task, actor) {
            return Err(EngineError::PermissionDenied { actor: actor.id() });
        }
        let subtask = Subtask::new(
            task_id,
            title,
            self.catalog.default_code().clone(),
            &*self.clock,
        )?;
        task.add_subtask(subtask.clone(), &*self.clock);
        self.repository.update(&task).await?;
        Ok(subtask)
    }

    /// Deletes a task and, by ownership, its subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] or
    /// [`EngineError::PermissionDenied`] when the actor is neither the
    /// creator, the assignee, nor an admin.
    pub async fn delete_task(&self, task_id: TaskId, actor: &Actor) -> EngineResult<()> {
        let _guard = self.locks.acquire(task_id).await;
        let task = self.load_required(task_id).await?;
        if !guard::can_delete(&task, actor) {
            return Err(EngineError::PermissionDenied { actor: actor.id() });
        }
        self.repository.remove(task_id).await?;
        tracing::info!(task_id = %task_id, "task deleted");
        Ok(())
    }

    /// Loads a task, mapping absence to [`EngineError::TaskNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`] or a repository error.
    pub async fn find_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.load_required(task_id).await
    }

    /// Validates and commits one status transition.
    ///
    /// The commit path runs inside the task's critical section:
    ///
    /// 1. load (absence fails with `TaskNotFound`);
    /// 2. permission guard (`PermissionDenied`);
    /// 3. catalog edge (`InvalidTransition` naming both labels);
    /// 4. completion gate re-check for success-final targets
    ///    (`IncompleteSubtasks` with the blocking count); authoritative
    ///    even though `compute_valid_transitions` already filters, to
    ///    defend against stale client state;
    /// 5. for terminal targets with confirmation required, return
    ///    [`Outcome::NeedsConfirmation`] without mutating;
    /// 6. otherwise commit, append exactly one audit record, and publish
    ///    an `Applied` event.
    ///
    /// # Errors
    ///
    /// Any of the taxonomy errors above; a `Rejected` event is published
    /// for every failure.
    pub async fn request_transition(&self, request: TransitionRequest) -> EngineResult<Outcome> {
        let result = self.request_transition_inner(&request).await;
        if let Err(err) = &result {
            self.notifications.publish(TaskEvent::rejected(
                ChangeSubject::Task {
                    task: request.task_id,
                },
                err.to_string(),
            ));
            tracing::debug!(task_id = %request.task_id, target = %request.target, error = %err, "transition rejected");
        }
        result
    }

    async fn request_transition_inner(&self, request: &TransitionRequest) -> EngineResult<Outcome> {
        let _guard = self.locks.acquire(request.task_id).await;
        let mut task = self.load_required(request.task_id).await?;
        self.validate_transition(&task, &request.actor, &request.target)?;

        if request.require_confirmation && self.catalog.is_final(&request.target) {
            let current = task.status().clone();
            self.notifications.publish(TaskEvent::needs_confirmation(
                task.id(),
                current.clone(),
                request.target.clone(),
            ));
            tracing::debug!(task_id = %task.id(), target = %request.target, "terminal transition awaiting confirmation");
            return Ok(Outcome::NeedsConfirmation {
                task_id: task.id(),
                current,
                target: request.target.clone(),
            });
        }

        let old_status = task.apply_status(request.target.clone(), &*self.clock);
        let subject = ChangeSubject::Task { task: task.id() };
        self.persist_change(
            &task,
            subject,
            &old_status,
            &request.target,
            request.actor.id(),
            request.reason.clone(),
        )
        .await?;
        tracing::info!(task_id = %task.id(), from = %old_status, to = %request.target, "status transition applied");
        Ok(Outcome::Applied {
            subject,
            old_status,
            new_status: request.target.clone(),
        })
    }

    /// Validates and commits one subtask status transition.
    ///
    /// Subtasks evolve through the same catalog under the parent task's
    /// permission guard. The completion gate and the two-phase confirmation
    /// do not apply; every applied change is audited with a `Subtask`
    /// subject.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TaskNotFound`],
    /// [`EngineError::PermissionDenied`], [`EngineError::Domain`] for an
    /// unknown subtask, or [`EngineError::InvalidTransition`].
    pub async fn request_subtask_transition(
        &self,
        request: SubtaskTransitionRequest,
    ) -> EngineResult<Outcome> {
        let result = self.request_subtask_transition_inner(&request).await;
        if let Err(err) = &result {
            self.notifications.publish(TaskEvent::rejected(
                ChangeSubject::Subtask {
                    task: request.task_id,
                    subtask: request.subtask_id,
                },
                err.to_string(),
            ));
            tracing::debug!(task_id = %request.task_id, subtask_id = %request.subtask_id, error = %err, "subtask transition rejected");
        }
        result
    }

    async fn request_subtask_transition_inner(
        &self,
        request: &SubtaskTransitionRequest,
    ) -> EngineResult<Outcome> {
        let _guard = self.locks.acquire(request.task_id).await;
        let mut task = self.load_required(request.task_id).await?;
        if !guard::can_change_status(&task, &request.actor) {
            return Err(EngineError::PermissionDenied {
                actor: request.actor.id(),
            });
        }
        let current = task
            .subtask(request.subtask_id)
            .map(|subtask| subtask.status().clone())
            .ok_or(TaskDomainError::UnknownSubtask(request.subtask_id))?;
        if !self.catalog.valid_targets(&current).contains(&request.target) {
            return Err(EngineError::InvalidTransition {
                from: self.catalog.label_of(&current),
                to: self.catalog.label_of(&request.target),
            });
        }

        let old_status =
            task.apply_subtask_status(request.subtask_id, request.target.clone(), &*self.clock)?;
        let subject = ChangeSubject::Subtask {
            task: task.id(),
            subtask: request.subtask_id,
        };
        self.persist_change(
            &task,
            subject,
            &old_status,
            &request.target,
            request.actor.id(),
            request.reason.clone(),
        )
        .await?;
        tracing::info!(task_id = %task.id(), subtask_id = %request.subtask_id, from = %old_status, to = %request.target, "subtask transition applied");
        Ok(Outcome::Applied {
            subject,
            old_status,
            new_status: request.target.clone(),
        })
    }

    pub(crate) async fn load_required(&self, task_id: TaskId) -> EngineResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(EngineError::TaskNotFound(task_id))
    }

    pub(crate) async fn update_task(&self, task: &Task) -> EngineResult<()> {
        self.repository.update(task).await?;
        Ok(())
    }

    pub(crate) fn publish(&self, event: TaskEvent) {
        self.notifications.publish(event);
    }

    /// Persists an applied change: repository update (optimistic version
    /// check), then the audit append as the last step in the critical
    /// section, then the fire-and-forget `Applied` event.
    pub(crate) async fn persist_change(
        &self,
        task: &Task,
        subject: ChangeSubject,
        old_status: &StatusCode,
        new_status: &StatusCode,
        actor: ActorId,
        reason: Option<String>,
    ) -> EngineResult<()> {
        self.repository.update(task).await?;
        let mut record = StatusChangeRecord::new(
            subject,
            old_status.clone(),
            new_status.clone(),
            actor,
            self.clock.utc(),
        );
        if let Some(reason) = reason {
            record = record.with_reason(reason);
        }
        self.audit.append(&record).await?;
        self.notifications.publish(TaskEvent::applied(
            subject,
            old_status.clone(),
            new_status.clone(),
        ));
        Ok(())
    }
}
