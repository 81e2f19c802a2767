//! Approval state for tasks whose completion is decided by a vote.
//!
//! An approval task carries an [`ApprovalState`]: the consensus mode, the
//! approver roster, and an append-only history of recorded decisions. The
//! state enforces the per-approver preconditions (one decision each,
//! sequential turn order) and computes the overall resolution after every
//! vote; turning a resolution into a status transition is the service
//! layer's job.

use super::{ApproverId, TaskDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule used to combine approver votes into one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// The first decisive vote, approve or reject, settles the task.
    FirstWins,
    /// Every approver must approve; a single rejection settles the task.
    Unanimous,
    /// Approvers vote strictly in roster order; a rejection at any position
    /// settles the task.
    Sequential,
}

/// A single approver's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The approver accepted the task.
    Approved,
    /// The approver rejected the task.
    Rejected,
}

impl Decision {
    /// Returns true for an approving vote.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Decision status of one approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverStatus {
    /// No decision recorded yet.
    Pending,
    /// The approver approved.
    Approved,
    /// The approver rejected.
    Rejected,
}

impl From<Decision> for ApproverStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Self::Approved,
            Decision::Rejected => Self::Rejected,
        }
    }
}

/// One designated approver on an approval task.
///
/// An approver decides exactly once; a recorded decision is frozen together
/// with its comment and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    id: ApproverId,
    name: String,
    status: ApproverStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decided_at: Option<DateTime<Utc>>,
}

impl Approver {
    /// Creates a pending approver with a fresh identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ApproverId::new(),
            name: name.into(),
            status: ApproverStatus::Pending,
            comment: None,
            decided_at: None,
        }
    }

    /// Returns the approver identifier.
    #[must_use]
    pub const fn id(&self) -> ApproverId {
        self.id
    }

    /// Returns the approver display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the decision status.
    #[must_use]
    pub const fn status(&self) -> ApproverStatus {
        self.status
    }

    /// Returns the decision comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the decision timestamp, if decided.
    #[must_use]
    pub const fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    /// Returns true while no decision has been recorded.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ApproverStatus::Pending)
    }

    fn decide(&mut self, decision: Decision, comment: Option<String>, at: DateTime<Utc>) {
        self.status = decision.into();
        self.comment = comment;
        self.decided_at = Some(at);
    }
}

/// One recorded decision in the approval history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    /// The approver who decided.
    pub approver: ApproverId,
    /// The recorded vote.
    pub decision: Decision,
    /// Comment captured with the vote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the vote was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Errors raised while recording approver decisions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApprovalError {
    /// The approver is not on the task's roster.
    #[error("unknown approver: {0}")]
    UnknownApprover(ApproverId),

    /// The approver has already recorded a decision.
    #[error("approver '{0}' has already decided")]
    AlreadyDecided(String),

    /// In sequential mode, an approver decided out of turn.
    #[error("not your turn: waiting on approver '{expected}'")]
    NotYourTurn {
        /// Name of the approver whose turn it is.
        expected: String,
    },

    /// The overall approval is already resolved; remaining votes are stale.
    #[error("the approval has already been resolved")]
    Closed,
}

/// Setup parameters for configuring a task as an approval task.
#[derive(Debug, Clone)]
pub struct ApprovalSetup {
    mode: ApprovalMode,
    approvers: Vec<Approver>,
    auto_approve_after_days: Option<u32>,
}

impl ApprovalSetup {
    /// Creates a setup with the given consensus mode and an empty roster.
    #[must_use]
    pub const fn new(mode: ApprovalMode) -> Self {
        Self {
            mode,
            approvers: Vec::new(),
            auto_approve_after_days: None,
        }
    }

    /// Appends an approver to the roster. For sequential mode the roster
    /// order is the voting order.
    #[must_use]
    pub fn with_approver(mut self, name: impl Into<String>) -> Self {
        self.approvers.push(Approver::new(name));
        self
    }

    /// Enables auto-approval the given number of calendar days after the
    /// task's due date.
    #[must_use]
    pub const fn with_auto_approve_after_days(mut self, days: u32) -> Self {
        self.auto_approve_after_days = Some(days);
        self
    }
}

/// Vote aggregation state owned by an approval task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalState {
    mode: ApprovalMode,
    approvers: Vec<Approver>,
    /// Sequential-mode position: index of the approver whose turn it is.
    cursor: usize,
    history: Vec<ApprovalEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_approve_after_days: Option<u32>,
}

impl ApprovalState {
    /// Builds the approval state from setup parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyApproverRoster`] when the setup holds
    /// no approvers.
    pub fn from_setup(setup: ApprovalSetup) -> Result<Self, TaskDomainError> {
        if setup.approvers.is_empty() {
            return Err(TaskDomainError::EmptyApproverRoster);
        }
        Ok(Self {
            mode: setup.mode,
            approvers: setup.approvers,
            cursor: 0,
            history: Vec::new(),
            auto_approve_after_days: setup.auto_approve_after_days,
        })
    }

    /// Returns the consensus mode.
    #[must_use]
    pub const fn mode(&self) -> ApprovalMode {
        self.mode
    }

    /// Returns the approver roster in voting order.
    #[must_use]
    pub fn approvers(&self) -> &[Approver] {
        &self.approvers
    }

    /// Returns the recorded decision history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ApprovalEvent] {
        &self.history
    }

    /// Returns the configured auto-approval window in calendar days.
    #[must_use]
    pub const fn auto_approve_after_days(&self) -> Option<u32> {
        self.auto_approve_after_days
    }

    /// Returns the approver whose turn it is in sequential mode, or the
    /// first pending approver otherwise.
    #[must_use]
    pub fn next_pending(&self) -> Option<&Approver> {
        match self.mode {
            ApprovalMode::Sequential => self.approvers.get(self.cursor),
            ApprovalMode::FirstWins | ApprovalMode::Unanimous => {
                self.approvers.iter().find(|approver| approver.is_pending())
            }
        }
    }

    /// Records one approver's decision.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Closed`] once the overall approval is
    /// resolved, [`ApprovalError::UnknownApprover`] for an approver not on
    /// the roster, [`ApprovalError::AlreadyDecided`] when the approver has
    /// decided before, and [`ApprovalError::NotYourTurn`] when a
    /// sequential-mode approver votes ahead of the cursor.
    pub fn record(
        &mut self,
        approver_id: ApproverId,
        decision: Decision,
        comment: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), ApprovalError> {
        if self.resolution().is_some() {
            return Err(ApprovalError::Closed);
        }

        let position = self
            .approvers
            .iter()
            .position(|approver| approver.id() == approver_id)
            .ok_or(ApprovalError::UnknownApprover(approver_id))?;

        let already_decided = self
            .approvers
            .get(position)
            .is_some_and(|approver| !approver.is_pending());
        if already_decided {
            let name = self
                .approvers
                .get(position)
                .map_or_else(String::new, |approver| approver.name().to_owned());
            return Err(ApprovalError::AlreadyDecided(name));
        }

        if self.mode == ApprovalMode::Sequential && position != self.cursor {
            let expected = self
                .approvers
                .get(self.cursor)
                .map_or_else(String::new, |approver| approver.name().to_owned());
            return Err(ApprovalError::NotYourTurn { expected });
        }

        let decided_at = clock.utc();
        if let Some(approver) = self.approvers.get_mut(position) {
            approver.decide(decision, comment.clone(), decided_at);
        }
        self.history.push(ApprovalEvent {
            approver: approver_id,
            decision,
            comment,
            recorded_at: decided_at,
        });

        if self.mode == ApprovalMode::Sequential && decision.is_approved() {
            self.advance_cursor();
        }
        Ok(())
    }

    fn advance_cursor(&mut self) {
        let mut next = self.cursor.saturating_add(1);
        while self
            .approvers
            .get(next)
            .is_some_and(|approver| !approver.is_pending())
        {
            next = next.saturating_add(1);
        }
        self.cursor = next;
    }

    /// Computes the overall outcome implied by the recorded votes, if any.
    ///
    /// Evaluated after every decision; `None` means the approval is still
    /// open.
    #[must_use]
    pub fn resolution(&self) -> Option<Decision> {
        let any_rejected = self
            .approvers
            .iter()
            .any(|approver| approver.status() == ApproverStatus::Rejected);
        match self.mode {
            ApprovalMode::FirstWins => {
                let any_approved = self
                    .approvers
                    .iter()
                    .any(|approver| approver.status() == ApproverStatus::Approved);
                if any_approved {
                    Some(Decision::Approved)
                } else if any_rejected {
                    Some(Decision::Rejected)
                } else {
                    None
                }
            }
            ApprovalMode::Unanimous | ApprovalMode::Sequential => {
                let all_approved = self
                    .approvers
                    .iter()
                    .all(|approver| approver.status() == ApproverStatus::Approved);
                if any_rejected {
                    Some(Decision::Rejected)
                } else if all_approved {
                    Some(Decision::Approved)
                } else {
                    None
                }
            }
        }
    }

    /// Returns true once a resolution has been reached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution().is_some()
    }

    /// Looks up an approver by identifier.
    #[must_use]
    pub fn approver(&self, approver_id: ApproverId) -> Option<&Approver> {
        self.approvers
            .iter()
            .find(|approver| approver.id() == approver_id)
    }
}
