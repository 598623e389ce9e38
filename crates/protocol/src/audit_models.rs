//! Audit records for instrumented checker and analysis invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

/// Status of an audit record.
///
/// Transitions are monotonic: `pending -> started -> {succeeded, failed}`.
/// A record may also go straight from `pending` to a terminal state when the
/// `started` write was lost.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Started,
    Succeeded,
    Failed,
}

impl AuditStatus {
    fn rank(self) -> u8 {
        match self {
            AuditStatus::Pending => 0,
            AuditStatus::Started => 1,
            AuditStatus::Succeeded | AuditStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }

    /// Whether moving from `self` to `next` keeps the record monotonic.
    pub fn can_transition_to(self, next: AuditStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Which instrumented subsystem produced the record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Check,
    Analysis,
}

/// One instrumented invocation of a checker or analysis provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AuditRun {
    #[ts(type = "string")]
    pub id: Uuid,

    pub kind: AuditKind,

    /// Name of the checker or provider that was invoked.
    pub name: String,

    pub status: AuditStatus,

    /// Optional subject reference, e.g. an incident id.
    pub subject: Option<String>,

    /// Cross-system correlation id. Empty string when none applies.
    pub trace_id: String,

    /// Pipeline run id. Empty string outside a pipeline.
    pub run_id: String,

    /// Configuration snapshot with sensitive values masked.
    #[ts(type = "Record<string, unknown>")]
    pub config: BTreeMap<String, Value>,

    /// Serialized result summary on success.
    #[ts(type = "unknown")]
    pub result: Option<Value>,

    pub error: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,

    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,

    pub duration_ms: Option<u64>,
}
