//! Domain model for task lifecycle and approval consensus.
//!
//! The domain layer is pure: the status catalog, permission guard,
//! completion gate, task/subtask aggregates, and approval state carry no
//! infrastructure concerns. Persistence, identity, auditing, and
//! notification are ports implemented by adapters.

mod actor;
mod approval;
mod audit;
mod catalog;
mod error;
mod event;
pub mod gate;
pub mod guard;
mod ids;
mod status;
mod subtask;
mod task;

pub use actor::{Actor, ActorRole};
pub use approval::{
    ApprovalError, ApprovalEvent, ApprovalMode, ApprovalSetup, ApprovalState, Approver,
    ApproverStatus, Decision,
};
pub use audit::{ChangeSubject, StatusChangeRecord};
pub use catalog::{CatalogError, StatusCatalog};
pub use error::TaskDomainError;
pub use event::{Outcome, TaskEvent, TaskEventKind};
pub use ids::{ActorId, ApproverId, RecordId, SubtaskId, TaskId};
pub use status::{FinalKind, StatusCode, StatusDefinition};
pub use subtask::Subtask;
pub use task::{NewTaskParams, PersistedTaskData, Task, TaskKind};
