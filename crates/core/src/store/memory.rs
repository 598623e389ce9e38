use async_trait::async_trait;
use ol_protocol::{AuditRun, PipelineRun, RunStatus, StageExecution};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuditStore, RunStore, StoreError};

/// Process-local store backed by mutex-guarded maps.
#[derive(Default)]
pub struct InMemoryStore {
    runs: Mutex<HashMap<Uuid, PipelineRun>>,
    stages: Mutex<Vec<StageExecution>>,
    audits: Mutex<Vec<AuditRun>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for InMemoryStore {
    async fn create_run(&self, run: &PipelineRun) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().await;
        if runs.contains_key(&run.id) {
            return Err(StoreError::Conflict(format!("run {} already exists", run.id)));
        }
        runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &PipelineRun) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().await;
        match runs.get_mut(&run.id) {
            Some(stored) => {
                *stored = run.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("run {}", run.id))),
        }
    }

    async fn update_run_if(
        &self,
        run: &PipelineRun,
        expected: RunStatus,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().await;
        let stored = runs
            .get_mut(&run.id)
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run.id)))?;
        if stored.status != expected {
            return Err(StoreError::Conflict(format!(
                "run {} is {}, expected {}",
                run.id, stored.status, expected
            )));
        }
        *stored = run.clone();
        Ok(())
    }

    async fn get_run(&self, run_id: Uuid) -> Result<PipelineRun, StoreError> {
        self.runs
            .lock()
            .await
            .get(&run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))
    }

    async fn list_runs(&self) -> Result<Vec<PipelineRun>, StoreError> {
        let mut runs: Vec<PipelineRun> = self.runs.lock().await.values().cloned().collect();
        runs.sort_by_key(|r| r.created_at);
        Ok(runs)
    }

    async fn create_stage(&self, stage: &StageExecution) -> Result<(), StoreError> {
        let mut stages = self.stages.lock().await;
        if stages.iter().any(|s| s.id == stage.id) {
            return Err(StoreError::Conflict(format!(
                "stage {} already exists",
                stage.id
            )));
        }
        stages.push(stage.clone());
        Ok(())
    }

    async fn update_stage(&self, stage: &StageExecution) -> Result<(), StoreError> {
        let mut stages = self.stages.lock().await;
        match stages.iter_mut().find(|s| s.id == stage.id) {
            Some(stored) => {
                *stored = stage.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("stage {}", stage.id))),
        }
    }

    async fn list_stages(
        &self,
        run_id: Uuid,
        attempt: Option<u32>,
    ) -> Result<Vec<StageExecution>, StoreError> {
        let mut stages: Vec<StageExecution> = self
            .stages
            .lock()
            .await
            .iter()
            .filter(|s| s.run_id == run_id)
            .filter(|s| attempt.is_none_or(|a| s.attempt == a))
            .cloned()
            .collect();
        stages.sort_by_key(|s| (s.attempt, s.position));
        Ok(stages)
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn create_audit(&self, record: &AuditRun) -> Result<(), StoreError> {
        let mut audits = self.audits.lock().await;
        if audits.iter().any(|a| a.id == record.id) {
            return Err(StoreError::Conflict(format!(
                "audit {} already exists",
                record.id
            )));
        }
        audits.push(record.clone());
        Ok(())
    }

    async fn update_audit(&self, record: &AuditRun) -> Result<(), StoreError> {
        let mut audits = self.audits.lock().await;
        let stored = audits
            .iter_mut()
            .find(|a| a.id == record.id)
            .ok_or_else(|| StoreError::NotFound(format!("audit {}", record.id)))?;
        if !stored.status.can_transition_to(record.status) {
            return Err(StoreError::Conflict(format!(
                "audit {} cannot move from {:?} to {:?}",
                record.id, stored.status, record.status
            )));
        }
        *stored = record.clone();
        Ok(())
    }

    async fn get_audit(&self, id: Uuid) -> Result<AuditRun, StoreError> {
        self.audits
            .lock()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("audit {id}")))
    }

    async fn list_audits(&self) -> Result<Vec<AuditRun>, StoreError> {
        Ok(self.audits.lock().await.clone())
    }
}
