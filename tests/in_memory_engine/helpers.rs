//! Shared helpers for engine integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use quorum::task::{
    adapters::memory::{InMemoryAuditSink, InMemoryNotificationSink, InMemoryTaskRepository},
    domain::{
        Actor, ActorRole, FinalKind, StatusCatalog, StatusCode, StatusDefinition,
    },
    services::{ApprovalService, BatchService, TaskLockMap, TransitionService},
};
use rstest::fixture;

/// Service aliases over the in-memory adapters.
pub type Transitions = TransitionService<
    InMemoryTaskRepository,
    InMemoryAuditSink,
    InMemoryNotificationSink,
    DefaultClock,
>;
/// Approval service alias over the in-memory adapters.
pub type Approvals = ApprovalService<
    InMemoryTaskRepository,
    InMemoryAuditSink,
    InMemoryNotificationSink,
    DefaultClock,
>;
/// Batch service alias over the in-memory adapters.
pub type Batches = BatchService<
    InMemoryTaskRepository,
    InMemoryAuditSink,
    InMemoryNotificationSink,
    DefaultClock,
>;

/// Fully wired engine over in-memory adapters.
pub struct Engine {
    /// Repository handle for direct assertions.
    pub repository: Arc<InMemoryTaskRepository>,
    /// Audit sink handle for trail assertions.
    pub audit: Arc<InMemoryAuditSink>,
    /// Notification sink handle for event assertions.
    pub notifications: Arc<InMemoryNotificationSink>,
    /// Transition resolver.
    pub transitions: Transitions,
    /// Approval consensus engine.
    pub approvals: Approvals,
    /// Batch operator.
    pub batches: Batches,
}

/// Builds a status code, panicking on invalid test input.
pub fn code(value: &str) -> StatusCode {
    StatusCode::new(value).expect("valid status code")
}

/// Builds the catalog from the engine's reference scenario:
/// `OPEN -> {INPROGRESS, CANCELLED}`,
/// `INPROGRESS -> {ONHOLD, DONE, CANCELLED}`,
/// `ONHOLD -> {INPROGRESS, CANCELLED}`,
/// `DONE` success-final and `CANCELLED` cancel-final.
pub fn reference_catalog() -> StatusCatalog {
    StatusCatalog::new(vec![
        StatusDefinition::new(code("OPEN"), "Open")
            .as_default()
            .with_order(1)
            .with_transitions([code("INPROGRESS"), code("CANCELLED")]),
        StatusDefinition::new(code("INPROGRESS"), "In Progress")
            .with_order(2)
            .with_transitions([code("ONHOLD"), code("DONE"), code("CANCELLED")]),
        StatusDefinition::new(code("ONHOLD"), "On Hold")
            .with_order(3)
            .with_transitions([code("INPROGRESS"), code("CANCELLED")]),
        StatusDefinition::new(code("DONE"), "Done")
            .with_order(4)
            .final_as(FinalKind::Success),
        StatusDefinition::new(code("CANCELLED"), "Cancelled")
            .with_order(5)
            .final_as(FinalKind::Cancelled),
    ])
    .expect("valid reference catalog")
}

/// Provides a fully wired engine for each test.
#[fixture]
pub fn engine() -> Engine {
    let catalog = Arc::new(reference_catalog());
    let repository = Arc::new(InMemoryTaskRepository::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let notifications = Arc::new(InMemoryNotificationSink::new());
    let transitions = TransitionService::new(
        catalog,
        Arc::clone(&repository),
        Arc::clone(&audit),
        Arc::clone(&notifications),
        Arc::new(DefaultClock),
        Arc::new(TaskLockMap::new()),
    );
    Engine {
        repository,
        audit,
        notifications,
        approvals: ApprovalService::new(transitions.clone()),
        batches: BatchService::new(transitions.clone()),
        transitions,
    }
}

/// Provides a member actor.
#[fixture]
pub fn actor() -> Actor {
    Actor::new(ActorRole::Member)
}

/// Provides an admin actor.
#[fixture]
pub fn admin() -> Actor {
    Actor::new(ActorRole::Admin)
}
