//! Audit sink port: append-only storage for status change records.

use crate::task::domain::StatusChangeRecord;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit sink operations.
pub type AuditSinkResult<T> = Result<T, AuditSinkError>;

/// Append-only audit contract.
///
/// The port exposes no update or delete: once appended, a record is
/// immutable. The engine appends as the last step inside the per-task
/// critical section, so record order matches commit order and no record is
/// lost or duplicated relative to its triggering mutation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one status change record.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError::Storage`] when the record cannot be
    /// persisted.
    async fn append(&self, record: &StatusChangeRecord) -> AuditSinkResult<()>;
}

/// Errors returned by audit sink implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditSinkError {
    /// Storage-layer failure.
    #[error("audit storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditSinkError {
    /// Wraps a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
