//! Approval consensus engine: turning approver votes into one outcome.
//!
//! Active only for approval tasks. Each decision is recorded against the
//! task's approval state inside the task's critical section; when the
//! consensus mode resolves an overall outcome, the engine issues the
//! terminal transition as the system actor through the same validation
//! path as any other status change. Consensus outcomes bypass the
//! two-phase confirmation: the multi-party vote already constitutes
//! confirmation.

use mockable::Clock;

use crate::task::{
    domain::{
        Actor, ApprovalError, Approver, ApproverId, ChangeSubject, Decision, FinalKind, Outcome,
        Task, TaskEvent, TaskId,
    },
    ports::{AuditSink, NotificationSink, TaskRepository},
};

use super::{EngineError, EngineResult, TransitionService};

/// Reason recorded with vote-driven consensus transitions.
const CONSENSUS_REASON: &str = "approval consensus";

/// Reason recorded with timer-driven consensus transitions.
const AUTO_APPROVAL_REASON: &str = "auto-approval";

/// Comment attached to synthetic auto-approval votes.
const AUTO_APPROVAL_COMMENT: &str = "auto-approved after due date";

/// Parameter object for recording one approver's decision.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    task_id: TaskId,
    approver: ApproverId,
    decision: Decision,
    comment: Option<String>,
}

impl DecisionRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub const fn new(task_id: TaskId, approver: ApproverId, decision: Decision) -> Self {
        Self {
            task_id,
            approver,
            decision,
            comment: None,
        }
    }

    /// Attaches a comment to the decision.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Approval consensus service.
///
/// Wraps a [`TransitionService`] so resolutions reuse its validation, its
/// persistence path, and the shared per-task lock map.
pub struct ApprovalService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    transitions: TransitionService<R, A, N, C>,
}

impl<R, A, N, C> Clone for ApprovalService<R, A, N, C>
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

impl<R, A, N, C> ApprovalService<R, A, N, C>
where
    R: TaskRepository,
    A: AuditSink,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates an approval service sharing the transition service's ports
    /// and lock map.
    #[must_use]
    pub const fn new(transitions: TransitionService<R, A, N, C>) -> Self {
        Self { transitions }
    }

    /// Records one approver's decision and resolves the consensus when the
    /// mode's rule is met.
    ///
    /// The decision itself is persisted even when the resulting terminal
    /// transition is rejected (for example `IncompleteSubtasks` on a
    /// success-final target); the transition error is returned so the
    /// caller can surface it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotApprovalTask`] for regular tasks, the
    /// approval preconditions ([`ApprovalError::UnknownApprover`],
    /// [`ApprovalError::AlreadyDecided`], [`ApprovalError::NotYourTurn`],
    /// [`ApprovalError::Closed`]), or any transition-path error raised by
    /// the resolution.
    pub async fn record_decision(&self, request: DecisionRequest) -> EngineResult<Outcome> {
        let result = self.record_decision_inner(&request).await;
        if let Err(err) = &result {
            self.transitions.publish(TaskEvent::rejected(
                ChangeSubject::Task {
                    task: request.task_id,
                },
                err.to_string(),
            ));
            tracing::debug!(task_id = %request.task_id, approver = %request.approver, error = %err, "approval decision rejected");
        }
        result
    }

    async fn record_decision_inner(&self, request: &DecisionRequest) -> EngineResult<Outcome> {
        let _guard = self.transitions.locks().acquire(request.task_id).await;
        let mut task = self.transitions.load_required(request.task_id).await?;
        if !task.is_approval_task() {
            return Err(EngineError::NotApprovalTask(request.task_id));
        }
        if self.transitions.catalog().is_final(task.status()) {
            return Err(ApprovalError::Closed.into());
        }

        let clock = std::sync::Arc::clone(self.transitions.clock());
        let state = task
            .approval_state_mut()
            .ok_or(EngineError::NotApprovalTask(request.task_id))?;
        state.record(
            request.approver,
            request.decision,
            request.comment.clone(),
            &*clock,
        )?;
        let resolution = state.resolution();

        match resolution {
            None => {
                self.transitions.update_task(&task).await?;
                tracing::debug!(task_id = %task.id(), approver = %request.approver, "approval decision recorded, consensus still open");
                Ok(Outcome::DecisionRecorded {
                    task_id: task.id(),
                    approver: request.approver,
                    decision: request.decision,
                })
            }
            Some(decision) => {
                self.resolve_locked(&mut task, decision, CONSENSUS_REASON)
                    .await
            }
        }
    }

    /// Scheduler entry point: applies synthetic system approvals once the
    /// configured auto-approval window has elapsed.
    ///
    /// Records an approving vote (with an explanatory comment) for every
    /// still-pending approver, in roster order for sequential mode, and
    /// then resolves as usual. Exact scheduling lives with the external
    /// scheduler; this entry point only re-checks that the window
    /// (`due date + configured calendar days`) has actually elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AutoApprovalNotDue`] when the task has no
    /// auto-approval configuration, no due date, or the window has not yet
    /// elapsed; [`EngineError::NotApprovalTask`] for regular tasks;
    /// [`ApprovalError::Closed`] when the task is already terminal; or any
    /// transition-path error raised by the resolution.
    pub async fn auto_approve(&self, task_id: TaskId) -> EngineResult<Outcome> {
        let result = self.auto_approve_inner(task_id).await;
        if let Err(err) = &result {
            tracing::debug!(task_id = %task_id, error = %err, "auto-approval skipped");
        }
        result
    }

    async fn auto_approve_inner(&self, task_id: TaskId) -> EngineResult<Outcome> {
        let _guard = self.transitions.locks().acquire(task_id).await;
        let mut task = self.transitions.load_required(task_id).await?;
        let state = task
            .approval_state()
            .ok_or(EngineError::NotApprovalTask(task_id))?;
        if self.transitions.catalog().is_final(task.status()) {
            return Err(ApprovalError::Closed.into());
        }

        let days = state
            .auto_approve_after_days()
            .ok_or(EngineError::AutoApprovalNotDue(task_id))?;
        let due_at = task
            .due_at()
            .ok_or(EngineError::AutoApprovalNotDue(task_id))?;
        let deadline = due_at + chrono::Duration::days(i64::from(days));
        let clock = std::sync::Arc::clone(self.transitions.clock());
        if clock.utc() < deadline {
            return Err(EngineError::AutoApprovalNotDue(task_id));
        }

        let votes = task
            .approval_state_mut()
            .ok_or(EngineError::NotApprovalTask(task_id))?;
        while votes.resolution().is_none() {
            let Some(next) = votes.next_pending().map(Approver::id) else {
                break;
            };
            votes.record(
                next,
                Decision::Approved,
                Some(AUTO_APPROVAL_COMMENT.to_owned()),
                &*clock,
            )?;
        }
        let resolution = votes
            .resolution()
            .ok_or(EngineError::AutoApprovalNotDue(task_id))?;
        tracing::info!(task_id = %task_id, "auto-approval window elapsed, applying synthetic approvals");
        self.resolve_locked(&mut task, resolution, AUTO_APPROVAL_REASON)
            .await
    }

    /// Applies a resolved consensus outcome as a terminal transition by the
    /// system actor, inside the already-held critical section.
    async fn resolve_locked(
        &self,
        task: &mut Task,
        decision: Decision,
        reason: &str,
    ) -> EngineResult<Outcome> {
        let kind = if decision.is_approved() {
            FinalKind::Success
        } else {
            FinalKind::Cancelled
        };
        let target = self
            .transitions
            .catalog()
            .first_final(kind)
            .ok_or(EngineError::MissingFinalStatus(kind))?;
        let system = Actor::system();

        if let Err(err) = self.transitions.validate_transition(task, &system, &target) {
            // The votes stand even though the terminal transition failed.
            self.transitions.update_task(task).await?;
            tracing::warn!(task_id = %task.id(), target = %target, error = %err, "consensus resolution transition rejected");
            return Err(err);
        }

        let clock = std::sync::Arc::clone(self.transitions.clock());
        let old_status = task.apply_status(target.clone(), &*clock);
        let subject = ChangeSubject::Task { task: task.id() };
        self.transitions
            .persist_change(
                task,
                subject,
                &old_status,
                &target,
                system.id(),
                Some(reason.to_owned()),
            )
            .await?;
        tracing::info!(task_id = %task.id(), from = %old_status, to = %target, "approval consensus resolved");
        Ok(Outcome::Applied {
            subject,
            old_status,
            new_status: target,
        })
    }
}
