//! Payloads exchanged with external collaborators: health checkers, analysis
//! providers, alert ingestion and notification channels.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;

/// Outcome of a single health check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

/// Result yielded by a checker's `run()`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub metrics: BTreeMap<String, Value>,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            metrics: BTreeMap::new(),
        }
    }

    /// Synthetic result reported when a checker could not produce one.
    pub fn unknown(message: &str) -> Self {
        Self::new(CheckStatus::Unknown, message)
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// One recommendation produced by an analysis provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

/// Counts and references returned by alert ingestion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct IngestSummary {
    pub alerts_created: u32,
    pub alerts_updated: u32,
    pub alerts_resolved: u32,
    pub incident_id: Option<String>,
}

/// Notification severity, ordered from least to most severe.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// A message built for delivery across notification channels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct NotificationMessage {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub metadata: BTreeMap<String, String>,
}

/// Per-channel delivery status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

/// One delivery attempt on a single channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DeliveryRecord {
    pub channel: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
