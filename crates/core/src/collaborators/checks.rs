//! Health-check collaborator contract.

use async_trait::async_trait;
use ol_protocol::CheckResult;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Check failed: {0}")]
    Failed(String),
}

/// A single health check, e.g. CPU load or disk usage.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Stable name used to select the checker from a node's `checks` list.
    fn name(&self) -> &str;

    /// Disabled checkers are skipped when a node does not name its checks.
    fn enabled(&self) -> bool {
        true
    }

    /// Configuration snapshot recorded (redacted) on the audit record.
    fn config(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    async fn run(&self) -> Result<CheckResult, CheckError>;
}
