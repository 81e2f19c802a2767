//! In-memory integration tests for the lifecycle engine.
//!
//! Tests are organized into modules by functionality:
//! - `lifecycle_tests`: end-to-end transition flows and the audit trail
//! - `consensus_tests`: approval voting across the service surface
//! - `concurrency_tests`: racing requests against the per-task locks

mod in_memory_engine {
    pub mod helpers;

    mod concurrency_tests;
    mod consensus_tests;
    mod lifecycle_tests;
}
