//! In-memory audit sink preserving commit order.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::StatusChangeRecord,
    ports::{AuditSink, AuditSinkError, AuditSinkResult},
};

/// Thread-safe in-memory audit sink.
///
/// Append-only by construction: the adapter exposes a read view but no way
/// to mutate or remove appended records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<RwLock<Vec<StatusChangeRecord>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty in-memory audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all appended records in commit order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError::Storage`] when the store lock is poisoned.
    pub fn records(&self) -> AuditSinkResult<Vec<StatusChangeRecord>> {
        let records = self
            .records
            .read()
            .map_err(|err| AuditSinkError::storage(std::io::Error::other(err.to_string())))?;
        Ok(records.clone())
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, record: &StatusChangeRecord) -> AuditSinkResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|err| AuditSinkError::storage(std::io::Error::other(err.to_string())))?;
        records.push(record.clone());
        Ok(())
    }
}
