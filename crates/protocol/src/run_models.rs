//! Persisted run and stage models.
//!
//! A [`PipelineRun`] is one end-to-end execution of a definition; each node
//! reached during an attempt gets a [`StageExecution`]. Field names and status
//! spellings are read by reporting surfaces and must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle status of a pipeline run.
///
/// ```text
/// pending -> running -> succeeded
///                    -> failed -> retrying -> running ...
/// ```
///
/// `succeeded` is terminal. `failed -> retrying` is only ever requested from
/// outside the engine (an operator or a retry sweep).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Retrying,
}

impl RunStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Succeeded)
                | (RunStatus::Running, RunStatus::Failed)
                | (RunStatus::Failed, RunStatus::Retrying)
                | (RunStatus::Retrying, RunStatus::Running)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Retrying => "retrying",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of one node's execution within a run attempt.
///
/// `skipped` is only used when a required upstream failure aborts the chain
/// before the node starts; it is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StageStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::Pending, StageStatus::Running)
                | (StageStatus::Pending, StageStatus::Skipped)
                | (StageStatus::Running, StageStatus::Succeeded)
                | (StageStatus::Running, StageStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Succeeded | StageStatus::Failed | StageStatus::Skipped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Succeeded => "succeeded",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the failure that ended a run attempt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required node's handler returned an error.
    NodeExecution,
    /// A required node exceeded its timeout.
    Timeout,
    /// A stage or run record could not be written.
    Persistence,
}

/// One execution instance of a pipeline definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineRun {
    #[ts(type = "string")]
    pub id: Uuid,

    /// Name of the executed definition.
    pub pipeline_name: String,

    /// Version of the executed definition.
    pub pipeline_version: u32,

    pub status: RunStatus,

    /// 1-based attempt counter. Each retry increments it by exactly one.
    pub attempt: u32,

    /// Classification of the most recent failure, if any.
    pub last_error_kind: Option<FailureKind>,

    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,

    /// Cross-system correlation id. Empty string when none applies.
    pub trace_id: String,

    /// Optional triggering incident.
    pub incident_id: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,

    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Execution record of a single node within one run attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StageExecution {
    #[ts(type = "string")]
    pub id: Uuid,

    #[ts(type = "string")]
    pub run_id: Uuid,

    /// Run attempt this stage belongs to.
    pub attempt: u32,

    /// Zero-based position in the traversal.
    pub position: usize,

    pub node_id: String,

    pub node_type: String,

    pub required: bool,

    pub status: StageStatus,

    /// Snapshot of the (redacted) node configuration.
    #[ts(type = "unknown")]
    pub input: Value,

    /// Handler output on success.
    #[ts(type = "unknown")]
    pub output: Option<Value>,

    pub error: Option<String>,

    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,

    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,

    pub duration_ms: Option<u64>,
}
