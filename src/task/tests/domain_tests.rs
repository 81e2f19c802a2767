//! Unit tests for domain value types and the approval state machine.

use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;

use super::fixtures::five_status_catalog;
use crate::task::domain::{
    Actor, ActorRole, ApprovalError, ApprovalMode, ApprovalSetup, ApprovalState, Approver,
    ApproverId, ApproverStatus, Decision, NewTaskParams, PersistedTaskData, StatusCode, Subtask,
    Task, TaskDomainError, TaskId, TaskKind,
};

// ── Status codes ────────────────────────────────────────────────────

#[rstest]
#[case("OPEN", true)]
#[case("  OPEN  ", true)]
#[case("", false)]
#[case("   ", false)]
#[case("IN PROGRESS", false)]
fn status_code_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(StatusCode::new(raw).is_ok(), valid);
}

#[rstest]
fn status_code_trims_surrounding_whitespace() -> eyre::Result<()> {
    ensure!(StatusCode::new("  DONE  ")?.as_str() == "DONE");
    Ok(())
}

// ── Task construction ───────────────────────────────────────────────

#[rstest]
fn new_task_starts_in_catalog_default() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let creator = Actor::new(ActorRole::Member);
    let task = Task::new(
        NewTaskParams::new("A task", creator.id()),
        &catalog,
        &DefaultClock,
    )?;
    ensure!(task.status() == catalog.default_code());
    ensure!(task.version() == 0);
    ensure!(matches!(task.kind(), TaskKind::Regular));
    Ok(())
}

#[rstest]
fn empty_title_is_rejected() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let creator = Actor::new(ActorRole::Member);
    let result = Task::new(
        NewTaskParams::new("   ", creator.id()),
        &catalog,
        &DefaultClock,
    );
    ensure!(matches!(result, Err(TaskDomainError::EmptyTitle)));
    Ok(())
}

#[rstest]
fn approval_task_requires_a_roster() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let creator = Actor::new(ActorRole::Member);
    let result = Task::new(
        NewTaskParams::new("Needs approvers", creator.id())
            .with_approval(ApprovalSetup::new(ApprovalMode::Unanimous)),
        &catalog,
        &DefaultClock,
    );
    ensure!(matches!(result, Err(TaskDomainError::EmptyApproverRoster)));
    Ok(())
}

#[rstest]
fn subtasks_are_owned_and_removable() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let creator = Actor::new(ActorRole::Member);
    let mut task = Task::new(
        NewTaskParams::new("Parent", creator.id()),
        &catalog,
        &DefaultClock,
    )?;
    let subtask = Subtask::new(
        task.id(),
        "Child",
        catalog.default_code().clone(),
        &DefaultClock,
    )?;
    let subtask_id = subtask.id();
    task.add_subtask(subtask, &DefaultClock);
    ensure!(task.subtasks().len() == 1);
    ensure!(task.subtask(subtask_id).is_some());

    let removed = task.remove_subtask(subtask_id, &DefaultClock)?;
    ensure!(removed.id() == subtask_id);
    ensure!(task.subtasks().is_empty());

    let missing = task.remove_subtask(subtask_id, &DefaultClock);
    ensure!(matches!(missing, Err(TaskDomainError::UnknownSubtask(_))));
    Ok(())
}

#[rstest]
fn subtask_assignment_is_preserved() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let assignee = Actor::new(ActorRole::Member);
    let subtask = Subtask::new(
        TaskId::new(),
        "Assigned child",
        catalog.default_code().clone(),
        &DefaultClock,
    )?
    .with_assignee(assignee.id());
    ensure!(subtask.assignee() == Some(assignee.id()));
    Ok(())
}

#[rstest]
fn persisted_data_round_trips_the_aggregate() -> eyre::Result<()> {
    let catalog = five_status_catalog()?;
    let creator = Actor::new(ActorRole::Member);
    let mut task = Task::new(
        NewTaskParams::new("Persisted", creator.id()).with_assignee(creator.id()),
        &catalog,
        &DefaultClock,
    )?;
    let subtask = Subtask::new(
        task.id(),
        "Child",
        catalog.default_code().clone(),
        &DefaultClock,
    )?;
    task.add_subtask(subtask, &DefaultClock);

    let data = PersistedTaskData {
        id: task.id(),
        title: task.title().to_owned(),
        status: task.status().clone(),
        creator: task.creator(),
        assignee: task.assignee(),
        collaborators: task.collaborators().clone(),
        subtasks: task.subtasks().to_vec(),
        kind: task.kind().clone(),
        due_at: task.due_at(),
        version: task.version(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    };
    ensure!(Task::from_persisted(data.clone()) == task);
    Ok(())
}

// ── Approval state machine ──────────────────────────────────────────

fn roster(mode: ApprovalMode, names: &[&str]) -> eyre::Result<ApprovalState> {
    let mut setup = ApprovalSetup::new(mode);
    for name in names {
        setup = setup.with_approver(*name);
    }
    Ok(ApprovalState::from_setup(setup)?)
}

fn approver_id_at(state: &ApprovalState, index: usize) -> eyre::Result<ApproverId> {
    state
        .approvers()
        .get(index)
        .map(Approver::id)
        .ok_or_else(|| eyre::eyre!("no approver at index {index}"))
}

#[rstest]
fn decision_is_recorded_once() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Unanimous, &["Ada", "Grace"])?;
    let ada = approver_id_at(&state, 0)?;
    state.record(ada, Decision::Approved, Some("ship it".to_owned()), &DefaultClock)?;

    let recorded = state
        .approver(ada)
        .ok_or_else(|| eyre::eyre!("approver missing"))?;
    ensure!(recorded.status() == ApproverStatus::Approved);
    ensure!(recorded.comment() == Some("ship it"));
    ensure!(recorded.decided_at().is_some());
    ensure!(state.history().len() == 1);

    let second = state.record(ada, Decision::Rejected, None, &DefaultClock);
    ensure!(matches!(second, Err(ApprovalError::AlreadyDecided(_))));
    Ok(())
}

#[rstest]
fn unknown_approver_is_rejected() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::FirstWins, &["Ada"])?;
    let outsider = ApproverId::new();
    let result = state.record(outsider, Decision::Approved, None, &DefaultClock);
    ensure!(matches!(result, Err(ApprovalError::UnknownApprover(_))));
    Ok(())
}

#[rstest]
fn first_wins_resolves_on_first_decisive_vote() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::FirstWins, &["Ada", "Grace", "Edsger"])?;
    let grace = approver_id_at(&state, 1)?;
    state.record(grace, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Approved));

    // Remaining approvers are frozen as pending and no longer actionable.
    let ada = approver_id_at(&state, 0)?;
    let stale = state.record(ada, Decision::Rejected, None, &DefaultClock);
    ensure!(matches!(stale, Err(ApprovalError::Closed)));
    Ok(())
}

#[rstest]
fn first_wins_rejection_also_resolves() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::FirstWins, &["Ada", "Grace"])?;
    let ada = approver_id_at(&state, 0)?;
    state.record(ada, Decision::Rejected, None, &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Rejected));
    Ok(())
}

#[rstest]
fn unanimous_waits_for_every_approver() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Unanimous, &["Ada", "Grace", "Edsger"])?;
    let ada = approver_id_at(&state, 0)?;
    state.record(ada, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution().is_none());

    let grace = approver_id_at(&state, 1)?;
    state.record(grace, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution().is_none());

    let edsger = approver_id_at(&state, 2)?;
    state.record(edsger, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Approved));
    Ok(())
}

#[rstest]
fn unanimous_short_circuits_on_rejection() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Unanimous, &["Ada", "Grace", "Edsger"])?;
    let grace = approver_id_at(&state, 1)?;
    state.record(grace, Decision::Rejected, Some("not ready".to_owned()), &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Rejected));
    Ok(())
}

#[rstest]
fn sequential_enforces_turn_order() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Sequential, &["Ada", "Grace"])?;
    let grace = approver_id_at(&state, 1)?;
    let out_of_turn = state.record(grace, Decision::Approved, None, &DefaultClock);
    match out_of_turn {
        Err(ApprovalError::NotYourTurn { expected }) => ensure!(expected == "Ada"),
        other => bail!("expected NotYourTurn, got {other:?}"),
    }
    Ok(())
}

#[rstest]
fn sequential_advances_through_the_roster() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Sequential, &["Ada", "Grace", "Edsger"])?;
    let ada = approver_id_at(&state, 0)?;
    state.record(ada, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution().is_none());
    ensure!(
        state
            .next_pending()
            .is_some_and(|approver| approver.name() == "Grace")
    );

    let grace = approver_id_at(&state, 1)?;
    state.record(grace, Decision::Approved, None, &DefaultClock)?;
    let edsger = approver_id_at(&state, 2)?;
    state.record(edsger, Decision::Approved, None, &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Approved));
    Ok(())
}

#[rstest]
fn sequential_rejection_resolves_immediately() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Sequential, &["Ada", "Grace"])?;
    let ada = approver_id_at(&state, 0)?;
    state.record(ada, Decision::Rejected, None, &DefaultClock)?;
    ensure!(state.resolution() == Some(Decision::Rejected));

    let grace = approver_id_at(&state, 1)?;
    let stale = state.record(grace, Decision::Approved, None, &DefaultClock);
    ensure!(matches!(stale, Err(ApprovalError::Closed)));
    Ok(())
}

#[rstest]
fn history_preserves_vote_order() -> eyre::Result<()> {
    let mut state = roster(ApprovalMode::Unanimous, &["Ada", "Grace"])?;
    let ada = approver_id_at(&state, 0)?;
    let grace = approver_id_at(&state, 1)?;
    state.record(grace, Decision::Approved, None, &DefaultClock)?;
    state.record(ada, Decision::Approved, None, &DefaultClock)?;

    let voters: Vec<_> = state.history().iter().map(|event| event.approver).collect();
    ensure!(voters == vec![grace, ada]);
    Ok(())
}
