//! Racing requests against the per-task critical sections.

use quorum::task::{
    domain::{Actor, ActorRole, NewTaskParams},
    services::TransitionRequest,
};
use rstest::rstest;

use super::helpers::{Engine, actor, code, engine};

/// Two conflicting terminal requests race; the per-task lock serialises
/// them so exactly one commits and exactly one audit record is appended.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflicting_transitions_cannot_both_commit(engine: Engine, actor: Actor) {
    let task = engine
        .transitions
        .create_task(NewTaskParams::new("Contended task", actor.id()))
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .request_transition(TransitionRequest::new(
            task.id(),
            code("INPROGRESS"),
            actor.clone(),
        ))
        .await
        .expect("transition to INPROGRESS should succeed");
    let records_before = engine
        .audit
        .records()
        .expect("audit read should succeed")
        .len();

    let complete = {
        let transitions = engine.transitions.clone();
        let request = TransitionRequest::new(task.id(), code("DONE"), actor.clone());
        tokio::spawn(async move { transitions.request_transition(request).await })
    };
    let cancel = {
        let transitions = engine.transitions.clone();
        let request = TransitionRequest::new(task.id(), code("CANCELLED"), actor.clone());
        tokio::spawn(async move { transitions.request_transition(request).await })
    };

    let outcomes = [
        complete.await.expect("task should not panic"),
        cancel.await.expect("task should not panic"),
    ];
    let committed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(committed, 1, "exactly one racer may commit");

    // The loser saw the winner's terminal status, which has no edges.
    let records = engine.audit.records().expect("audit read should succeed");
    assert_eq!(records.len(), records_before + 1);

    let final_task = engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed");
    assert!(
        final_task.status() == &code("DONE") || final_task.status() == &code("CANCELLED"),
        "the task must land in exactly one terminal status"
    );
}

/// A transition racing an approval decision on the same task stays
/// serialised: both run, neither observes a torn snapshot, and the audit
/// trail matches the winning order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_racing_a_decision_is_serialised(engine: Engine, actor: Actor) {
    use quorum::task::domain::{ApprovalMode, ApprovalSetup, Approver, Decision};
    use quorum::task::services::DecisionRequest;

    let setup = ApprovalSetup::new(ApprovalMode::FirstWins).with_approver("Ada");
    let task = engine
        .transitions
        .create_task(
            NewTaskParams::new("Contended approval", actor.id())
                .with_assignee(actor.id())
                .with_approval(setup),
        )
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .request_transition(TransitionRequest::new(
            task.id(),
            code("INPROGRESS"),
            actor.clone(),
        ))
        .await
        .expect("transition to INPROGRESS should succeed");
    let approver = engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed")
        .approval_state()
        .expect("approval state should be present")
        .approvers()
        .iter()
        .map(Approver::id)
        .next()
        .expect("one approver configured");

    let cancel = {
        let transitions = engine.transitions.clone();
        let admin = Actor::new(ActorRole::Admin);
        let request = TransitionRequest::new(task.id(), code("CANCELLED"), admin);
        tokio::spawn(async move { transitions.request_transition(request).await })
    };
    let approve = {
        let approvals = engine.approvals.clone();
        let request = DecisionRequest::new(task.id(), approver, Decision::Approved);
        tokio::spawn(async move { approvals.record_decision(request).await })
    };

    let cancel_result = cancel.await.expect("task should not panic");
    let approve_result = approve.await.expect("task should not panic");

    // Whichever lost the race saw a terminal task and failed cleanly.
    assert!(cancel_result.is_ok() || approve_result.is_ok());
    let final_task = engine
        .transitions
        .find_task(task.id())
        .await
        .expect("task lookup should succeed");
    assert!(
        final_task.status() == &code("DONE") || final_task.status() == &code("CANCELLED"),
        "the race must settle in one terminal status"
    );
}
