//! Permission guard: pure predicates deciding who may act on a task.

use super::{Actor, ActorRole, Task};

/// Returns true when the actor may change the task's (or its subtasks')
/// status: the creator, the assignee, any collaborator, or an admin /
/// organisation admin.
#[must_use]
pub fn can_change_status(task: &Task, actor: &Actor) -> bool {
    if matches!(actor.role(), ActorRole::Admin | ActorRole::OrgAdmin) {
        return true;
    }
    let actor_id = actor.id();
    task.creator() == actor_id
        || task.assignee() == Some(actor_id)
        || task.collaborators().contains(&actor_id)
}

/// Returns true when the actor may delete the task: the creator, the
/// assignee, or an admin. Organisation admins do not get blanket delete.
#[must_use]
pub fn can_delete(task: &Task, actor: &Actor) -> bool {
    if matches!(actor.role(), ActorRole::Admin) {
        return true;
    }
    let actor_id = actor.id();
    task.creator() == actor_id || task.assignee() == Some(actor_id)
}
