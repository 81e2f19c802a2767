//! Approval voting flows over the in-memory adapters.

use quorum::task::{
    domain::{
        Actor, ApprovalMode, ApprovalSetup, Approver, ApproverId, NewTaskParams, Outcome, Task,
        TaskEventKind,
    },
    services::{DecisionRequest, TransitionRequest},
};
use rstest::rstest;

use super::helpers::{Engine, actor, code, engine};

async fn approval_task(engine: &Engine, owner: &Actor, mode: ApprovalMode) -> Task {
    let setup = ApprovalSetup::new(mode)
        .with_approver("Ada")
        .with_approver("Grace");
    let task = engine
        .transitions
        .create_task(
            NewTaskParams::new("Needs sign-off", owner.id())
                .with_assignee(owner.id())
                .with_approval(setup),
        )
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .request_transition(TransitionRequest::new(
            task.id(),
            code("INPROGRESS"),
            owner.clone(),
        ))
        .await
        .expect("transition to INPROGRESS should succeed");
    engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed")
}

fn roster(task: &Task) -> Vec<ApproverId> {
    task.approval_state()
        .expect("approval state should be present")
        .approvers()
        .iter()
        .map(Approver::id)
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unanimous_vote_completes_and_notifies(engine: Engine, actor: Actor) {
    let task = approval_task(&engine, &actor, ApprovalMode::Unanimous).await;
    let approvers = roster(&task);

    let first = engine
        .approvals
        .record_decision(DecisionRequest::new(
            task.id(),
            approvers[0],
            quorum::task::domain::Decision::Approved,
        ))
        .await
        .expect("first vote should be recorded");
    assert!(matches!(first, Outcome::DecisionRecorded { .. }));

    let second = engine
        .approvals
        .record_decision(
            DecisionRequest::new(
                task.id(),
                approvers[1],
                quorum::task::domain::Decision::Approved,
            )
            .with_comment("looks good"),
        )
        .await
        .expect("second vote should resolve");
    assert!(matches!(second, Outcome::Applied { .. }));

    let resolved = engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed");
    assert_eq!(resolved.status(), &code("DONE"));

    // The resolution reached the notification sink as an applied event.
    let applied_events = engine
        .notifications
        .events()
        .iter()
        .filter(|event| event.kind == TaskEventKind::Applied)
        .count();
    assert!(applied_events >= 2, "expected transition + resolution events");

    // The vote history survived in the stored aggregate.
    let history = resolved
        .approval_state()
        .expect("approval state should be present")
        .history()
        .len();
    assert_eq!(history, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sequential_rejection_cancels_and_freezes_the_rest(engine: Engine, actor: Actor) {
    let task = approval_task(&engine, &actor, ApprovalMode::Sequential).await;
    let approvers = roster(&task);

    engine
        .approvals
        .record_decision(
            DecisionRequest::new(
                task.id(),
                approvers[0],
                quorum::task::domain::Decision::Rejected,
            )
            .with_comment("missing acceptance criteria"),
        )
        .await
        .expect("rejection should resolve the consensus");

    let resolved = engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed");
    assert_eq!(resolved.status(), &code("CANCELLED"));

    // The second approver's vote window is closed.
    let stale = engine
        .approvals
        .record_decision(DecisionRequest::new(
            task.id(),
            approvers[1],
            quorum::task::domain::Decision::Approved,
        ))
        .await;
    assert!(stale.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_transitions_on_approval_tasks_stay_guarded(engine: Engine, actor: Actor) {
    let task = approval_task(&engine, &actor, ApprovalMode::FirstWins).await;

    // An approval task still accepts regular non-terminal edits.
    let paused = engine
        .transitions
        .request_transition(TransitionRequest::new(
            task.id(),
            code("ONHOLD"),
            actor.clone(),
        ))
        .await
        .expect("pausing an approval task should succeed");
    assert!(matches!(paused, Outcome::Applied { .. }));
}
