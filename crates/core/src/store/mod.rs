//! Persistence for pipeline runs, stage executions and audit records.
//!
//! The [`RunStore`] and [`AuditStore`] traits define the row operations the
//! engine and the audit wrapper need. Each call is an independent atomic
//! update; nothing here spans transactions across calls.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use ol_protocol::{AuditRun, PipelineRun, RunStatus, StageExecution};
use uuid::Uuid;

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write conflicts with the stored state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for pipeline runs and their stage executions.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Create a new run. Fails with `Conflict` if the id exists.
    async fn create_run(&self, run: &PipelineRun) -> Result<(), StoreError>;

    /// Overwrite a stored run.
    async fn update_run(&self, run: &PipelineRun) -> Result<(), StoreError>;

    /// Overwrite a stored run only if its stored status is `expected`.
    async fn update_run_if(
        &self,
        run: &PipelineRun,
        expected: RunStatus,
    ) -> Result<(), StoreError>;

    /// Get a run by id.
    async fn get_run(&self, run_id: Uuid) -> Result<PipelineRun, StoreError>;

    /// List all runs, oldest first.
    async fn list_runs(&self) -> Result<Vec<PipelineRun>, StoreError>;

    /// Create a stage record.
    async fn create_stage(&self, stage: &StageExecution) -> Result<(), StoreError>;

    /// Overwrite a stored stage record.
    async fn update_stage(&self, stage: &StageExecution) -> Result<(), StoreError>;

    /// List stages of a run ordered by attempt then position. With
    /// `attempt` set, only that attempt's stages are returned.
    async fn list_stages(
        &self,
        run_id: Uuid,
        attempt: Option<u32>,
    ) -> Result<Vec<StageExecution>, StoreError>;
}

/// Storage for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Create a new audit record.
    async fn create_audit(&self, record: &AuditRun) -> Result<(), StoreError>;

    /// Overwrite an audit record. Status must move forward.
    async fn update_audit(&self, record: &AuditRun) -> Result<(), StoreError>;

    /// Get an audit record by id.
    async fn get_audit(&self, id: Uuid) -> Result<AuditRun, StoreError>;

    /// List all audit records, oldest first.
    async fn list_audits(&self) -> Result<Vec<AuditRun>, StoreError>;
}
