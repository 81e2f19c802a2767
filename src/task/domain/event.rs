//! Outcome and event values returned by engine calls.
//!
//! The original system signalled status changes through an implicit global
//! event bus; here every engine call returns an explicit [`Outcome`] and
//! publishes a [`TaskEvent`] to the notification port, so presentation
//! collaborators render results without shared mutable state.

use super::{ApproverId, ChangeSubject, Decision, StatusCode, TaskId};
use serde::{Deserialize, Serialize};

/// Result of a successful engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A status change was committed.
    Applied {
        /// What changed.
        subject: ChangeSubject,
        /// Status before the change.
        old_status: StatusCode,
        /// Status after the change.
        new_status: StatusCode,
    },
    /// The requested transition targets a terminal status and requires an
    /// explicit confirmation before it is committed. No state was mutated.
    NeedsConfirmation {
        /// The task the request addressed.
        task_id: TaskId,
        /// Current status.
        current: StatusCode,
        /// Requested terminal status.
        target: StatusCode,
    },
    /// An approver's vote was recorded without resolving the consensus.
    DecisionRecorded {
        /// The approval task.
        task_id: TaskId,
        /// The approver who voted.
        approver: ApproverId,
        /// The recorded vote.
        decision: Decision,
    },
}

/// Kind discriminator for published task events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    /// A status change was committed.
    Applied,
    /// A terminal transition is awaiting confirmation.
    NeedsConfirmation,
    /// A request was rejected.
    Rejected,
}

/// Event published to the notification sink after each engine call.
///
/// Fire-and-forget: sinks must not fail the triggering operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Event kind.
    pub kind: TaskEventKind,
    /// What the event concerns.
    pub subject: ChangeSubject,
    /// Status before the change, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<StatusCode>,
    /// Status after the change, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<StatusCode>,
    /// Human-readable detail for rejected requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TaskEvent {
    /// Builds an `Applied` event.
    #[must_use]
    pub const fn applied(
        subject: ChangeSubject,
        old_status: StatusCode,
        new_status: StatusCode,
    ) -> Self {
        Self {
            kind: TaskEventKind::Applied,
            subject,
            old_status: Some(old_status),
            new_status: Some(new_status),
            detail: None,
        }
    }

    /// Builds a `NeedsConfirmation` event.
    #[must_use]
    pub const fn needs_confirmation(
        task_id: TaskId,
        current: StatusCode,
        target: StatusCode,
    ) -> Self {
        Self {
            kind: TaskEventKind::NeedsConfirmation,
            subject: ChangeSubject::Task { task: task_id },
            old_status: Some(current),
            new_status: Some(target),
            detail: None,
        }
    }

    /// Builds a `Rejected` event carrying the failure detail.
    #[must_use]
    pub const fn rejected(subject: ChangeSubject, detail: String) -> Self {
        Self {
            kind: TaskEventKind::Rejected,
            subject,
            old_status: None,
            new_status: None,
            detail: Some(detail),
        }
    }
}
