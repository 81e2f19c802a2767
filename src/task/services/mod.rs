//! Application services: the transition resolver, the approval consensus
//! engine, and the batch operator, plus the per-task lock map they share.

mod batch;
mod consensus;
mod error;
mod locks;
mod transition;

pub use batch::{BatchFailure, BatchOutcome, BatchRequest, BatchService};
pub use consensus::{ApprovalService, DecisionRequest};
pub use error::{EngineError, EngineResult};
pub use locks::TaskLockMap;
pub use transition::{SubtaskTransitionRequest, TransitionRequest, TransitionService};
