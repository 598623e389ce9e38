//! Run manager: the entry point for starting runs and handling retries.
//!
//! The executor never retries on its own. A failed run moves to `retrying`
//! only through [`RunManager::request_retry`] (an operator action) or
//! [`RunManager::retry_sweep`], and re-executes through
//! [`RunManager::retry`].

use anyhow::{Context, Result};
use ol_protocol::{PipelineDefinition, PipelineRun, RunStatus, StageExecution};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::context::ExecutionContext;
use crate::engine::{EngineError, PipelineEngine};
use crate::state::mark_retrying;
use crate::store::{RunStore, StoreError};

/// Coordinates runs over one engine and its store.
pub struct RunManager {
    engine: Arc<PipelineEngine>,
    store: Arc<dyn RunStore>,
}

impl RunManager {
    /// Create a new RunManager around `engine`, sharing its store.
    pub fn new(engine: PipelineEngine) -> Self {
        let store = engine.store();
        Self {
            engine: Arc::new(engine),
            store,
        }
    }

    pub fn engine(&self) -> &PipelineEngine {
        &self.engine
    }

    /// Execute `definition` as a new run.
    pub async fn start(
        &self,
        definition: &PipelineDefinition,
        context: ExecutionContext,
    ) -> Result<PipelineRun, EngineError> {
        self.engine.execute(definition, context).await
    }

    /// Start the definition named `name` from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no definition has that name or the run cannot be
    /// started.
    pub async fn start_named(
        &self,
        config: &AppConfig,
        name: &str,
        context: ExecutionContext,
    ) -> Result<PipelineRun> {
        let definition = config
            .pipeline(name)
            .with_context(|| format!("Pipeline '{name}' not found"))?;
        self.start(definition, context)
            .await
            .with_context(|| format!("Failed to run pipeline '{name}'"))
    }

    /// Operator action: move a failed run to `retrying`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Transition`] if the run is not `failed`
    /// - [`EngineError::Store`] if the run is missing or changed concurrently
    pub async fn request_retry(&self, run_id: Uuid) -> Result<PipelineRun, EngineError> {
        let mut run = self.store.get_run(run_id).await?;
        mark_retrying(&mut run, None).await?;
        self.store.update_run_if(&run, RunStatus::Failed).await?;
        info!(run_id = %run_id, attempt = run.attempt, "retry requested");
        Ok(run)
    }

    /// Re-execute a `retrying` run from its first node.
    pub async fn retry(
        &self,
        run_id: Uuid,
        definition: &PipelineDefinition,
        context: ExecutionContext,
    ) -> Result<PipelineRun, EngineError> {
        self.engine.retry(run_id, definition, context).await
    }

    /// Move every failed run with fewer than `max_attempts` attempts to
    /// `retrying` and return their ids.
    ///
    /// Runs that change status while the sweep is running are skipped.
    pub async fn retry_sweep(&self, max_attempts: u32) -> Result<Vec<Uuid>, EngineError> {
        let candidates: Vec<PipelineRun> = self
            .store
            .list_runs()
            .await?
            .into_iter()
            .filter(|run| run.status == RunStatus::Failed && run.attempt < max_attempts)
            .collect();

        let mut marked = Vec::with_capacity(candidates.len());
        for run in candidates {
            match self.request_retry(run.id).await {
                Ok(_) => marked.push(run.id),
                Err(EngineError::Store(StoreError::Conflict(reason)))
                | Err(EngineError::Store(StoreError::NotFound(reason))) => {
                    warn!(run_id = %run.id, reason = %reason, "run changed during retry sweep, skipping");
                }
                Err(EngineError::Transition(e)) => {
                    warn!(run_id = %run.id, error = %e, "run changed during retry sweep, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(marked = marked.len(), max_attempts, "retry sweep finished");
        Ok(marked)
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<PipelineRun, EngineError> {
        Ok(self.store.get_run(run_id).await?)
    }

    /// Stage records of a run, optionally for one attempt only.
    pub async fn stages(
        &self,
        run_id: Uuid,
        attempt: Option<u32>,
    ) -> Result<Vec<StageExecution>, EngineError> {
        Ok(self.store.list_stages(run_id, attempt).await?)
    }
}
