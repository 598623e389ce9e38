//! Output documents produced by the built-in node handlers.
//!
//! These shapes are stored on stage records and read by downstream nodes
//! and reporting surfaces, so field names are part of the stable contract.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::collaborator_models::{CheckResult, CheckStatus, DeliveryRecord, Recommendation, Severity};

/// One checker's result inside a context node's output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct CheckOutcome {
    pub name: String,
    #[serde(flatten)]
    pub result: CheckResult,
}

/// Per-status tally of a context node's checker results.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, TS)]
pub struct CheckCounts {
    pub ok: u32,
    pub warning: u32,
    pub critical: u32,
    pub unknown: u32,
}

impl CheckCounts {
    pub fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Ok => self.ok += 1,
            CheckStatus::Warning => self.warning += 1,
            CheckStatus::Critical => self.critical += 1,
            CheckStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.ok + self.warning + self.critical + self.unknown
    }
}

/// Output of a `context` node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ContextOutput {
    pub results: Vec<CheckOutcome>,
    pub counts: CheckCounts,
}

impl ContextOutput {
    /// Results whose status is anything but `ok`.
    pub fn failing(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.results
            .iter()
            .filter(|outcome| outcome.result.status != CheckStatus::Ok)
    }
}

/// Output of an `intelligence` node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct IntelligenceOutput {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    pub recommendations: Vec<Recommendation>,
    pub count: u32,
    pub summary: String,
}

/// Output of a `notify` node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct NotifyOutput {
    pub severity: Severity,
    pub title: String,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub deliveries: Vec<DeliveryRecord>,
}
