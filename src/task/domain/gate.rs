//! Completion gate: sub-task state checks guarding successful completion.
//!
//! The gate applies only to success-final targets. Cancelling a task is
//! always allowed regardless of subtask state; completing it requires every
//! subtask to be settled (success-final or cancel-final).

use super::{StatusCatalog, StatusCode, Task};

/// Counts subtasks whose status blocks successful completion.
///
/// A subtask blocks unless its status is an active terminal definition;
/// unknown or inactive subtask statuses count as blocking (fails closed).
#[must_use]
pub fn blocking_subtasks(catalog: &StatusCatalog, task: &Task) -> usize {
    task.subtasks()
        .iter()
        .filter(|subtask| catalog.final_kind_of(subtask.status()).is_none())
        .count()
}

/// Returns true when the task may enter the given target status.
///
/// Non-success-final targets pass unconditionally; success-final targets
/// pass only when no subtask blocks.
#[must_use]
pub fn can_enter_final(catalog: &StatusCatalog, task: &Task, target: &StatusCode) -> bool {
    if !catalog.is_success_final(target) {
        return true;
    }
    blocking_subtasks(catalog, task) == 0
}
