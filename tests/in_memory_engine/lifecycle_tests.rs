//! End-to-end lifecycle flows over the in-memory adapters.

use quorum::task::{
    domain::{Actor, ChangeSubject, NewTaskParams, Outcome},
    services::{
        BatchRequest, EngineError, SubtaskTransitionRequest, TransitionRequest,
    },
};
use rstest::rstest;

use super::helpers::{Engine, actor, admin, code, engine};

/// The reference scenario: a task `INPROGRESS` with one `INPROGRESS`
/// subtask cannot complete; once the subtask is done, completion runs the
/// two-phase confirmation and appends exactly one audit record.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gated_completion_with_confirmation_flow(engine: Engine, admin: Actor) {
    let task = engine
        .transitions
        .create_task(NewTaskParams::new("Release 1.0", admin.id()).with_assignee(admin.id()))
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .request_transition(TransitionRequest::new(
            task.id(),
            code("INPROGRESS"),
            admin.clone(),
        ))
        .await
        .expect("transition to INPROGRESS should succeed");
    let subtask = engine
        .transitions
        .add_subtask(task.id(), "Write the changelog", &admin)
        .await
        .expect("subtask creation should succeed");
    engine
        .transitions
        .request_subtask_transition(SubtaskTransitionRequest::new(
            task.id(),
            subtask.id(),
            code("INPROGRESS"),
            admin.clone(),
        ))
        .await
        .expect("subtask transition should succeed");

    // Completion is blocked while the subtask is in flight.
    let blocked = engine
        .transitions
        .request_transition(
            TransitionRequest::new(task.id(), code("DONE"), admin.clone())
                .requiring_confirmation(),
        )
        .await;
    assert!(matches!(
        blocked,
        Err(EngineError::IncompleteSubtasks { blocking: 1 })
    ));

    // Settle the subtask.
    engine
        .transitions
        .request_subtask_transition(SubtaskTransitionRequest::new(
            task.id(),
            subtask.id(),
            code("DONE"),
            admin.clone(),
        ))
        .await
        .expect("subtask completion should succeed");

    // The same request now pauses for confirmation without mutating.
    let paused = engine
        .transitions
        .request_transition(
            TransitionRequest::new(task.id(), code("DONE"), admin.clone())
                .requiring_confirmation(),
        )
        .await
        .expect("confirmation pause should succeed");
    assert!(matches!(paused, Outcome::NeedsConfirmation { .. }));

    let records_before = engine
        .audit
        .records()
        .expect("audit read should succeed")
        .len();

    // Confirming commits and appends exactly one record.
    let applied = engine
        .transitions
        .request_transition(TransitionRequest::new(task.id(), code("DONE"), admin.clone()))
        .await
        .expect("confirmed completion should succeed");
    match applied {
        Outcome::Applied {
            old_status,
            new_status,
            ..
        } => {
            assert_eq!(old_status, code("INPROGRESS"));
            assert_eq!(new_status, code("DONE"));
        }
        other => panic!("expected Applied, got {other:?}"),
    }

    let records = engine.audit.records().expect("audit read should succeed");
    assert_eq!(records.len(), records_before + 1);
    let last = records.last().expect("audit trail should not be empty");
    assert_eq!(last.subject, ChangeSubject::Task { task: task.id() });
    assert_eq!(last.old_status, code("INPROGRESS"));
    assert_eq!(last.new_status, code("DONE"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn audit_trail_preserves_commit_order(engine: Engine, actor: Actor) {
    let task = engine
        .transitions
        .create_task(NewTaskParams::new("Audited task", actor.id()))
        .await
        .expect("task creation should succeed");

    for target in ["INPROGRESS", "ONHOLD", "INPROGRESS", "CANCELLED"] {
        engine
            .transitions
            .request_transition(TransitionRequest::new(
                task.id(),
                code(target),
                actor.clone(),
            ))
            .await
            .expect("transition should succeed");
    }

    let records = engine.audit.records().expect("audit read should succeed");
    let trail: Vec<(String, String)> = records
        .iter()
        .map(|record| {
            (
                record.old_status.as_str().to_owned(),
                record.new_status.as_str().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        trail,
        vec![
            ("OPEN".to_owned(), "INPROGRESS".to_owned()),
            ("INPROGRESS".to_owned(), "ONHOLD".to_owned()),
            ("ONHOLD".to_owned(), "INPROGRESS".to_owned()),
            ("INPROGRESS".to_owned(), "CANCELLED".to_owned()),
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_is_all_or_nothing_across_the_services(engine: Engine, actor: Actor) {
    let movable = engine
        .transitions
        .create_task(NewTaskParams::new("Movable", actor.id()))
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .request_transition(TransitionRequest::new(
            movable.id(),
            code("INPROGRESS"),
            actor.clone(),
        ))
        .await
        .expect("transition should succeed");
    let stuck = engine
        .transitions
        .create_task(NewTaskParams::new("Stuck", actor.id()))
        .await
        .expect("task creation should succeed");

    // ONHOLD is illegal from OPEN, so the whole batch is rejected.
    let rejected = engine
        .batches
        .apply_to_many(BatchRequest::new(
            [movable.id(), stuck.id()],
            code("ONHOLD"),
            actor.clone(),
        ))
        .await;
    assert!(rejected.is_err());
    let untouched = engine
        .transitions
        .find_task(movable.id())
        .await
        .expect("task lookup should succeed");
    assert_eq!(untouched.status(), &code("INPROGRESS"));

    // Cancellation is legal from both statuses and commits everywhere.
    let outcome = engine
        .batches
        .apply_to_many(BatchRequest::new(
            [movable.id(), stuck.id()],
            code("CANCELLED"),
            actor.clone(),
        ))
        .await
        .expect("batch should commit");
    assert!(outcome.is_complete());
    assert_eq!(outcome.applied().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_removes_it_from_the_store(engine: Engine, actor: Actor) {
    let task = engine
        .transitions
        .create_task(NewTaskParams::new("Disposable", actor.id()))
        .await
        .expect("task creation should succeed");
    engine
        .transitions
        .add_subtask(task.id(), "Disposable child", &actor)
        .await
        .expect("subtask creation should succeed");

    engine
        .transitions
        .delete_task(task.id(), &actor)
        .await
        .expect("deletion should succeed");
    assert!(
        engine
            .repository
            .is_empty()
            .expect("repository read should succeed")
    );
}
