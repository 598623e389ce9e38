//! Alert-ingestion collaborator contract.

use async_trait::async_trait;
use ol_protocol::IngestSummary;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Invalid alert payload: {0}")]
    InvalidPayload(String),
    #[error("Ingestion failed: {0}")]
    Failed(String),
}

/// Parses an inbound alert payload into alert and incident records.
#[async_trait]
pub trait AlertIngestor: Send + Sync {
    async fn ingest(&self, source: &str, payload: &Value) -> Result<IngestSummary, IngestError>;
}
