//! Port contracts for the engine's external collaborators.

mod audit;
mod identity;
mod notify;
mod repository;

pub use audit::{AuditSink, AuditSinkError, AuditSinkResult};
pub use identity::IdentityProvider;
pub use notify::NotificationSink;
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
