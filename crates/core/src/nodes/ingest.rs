//! `ingest` node: hands an inbound alert payload to the ingestion collaborator.

use async_trait::async_trait;
use ol_protocol::NodeConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::base::{optional_str, ConfigFault, NodeHandler};
use super::NodeError;
use crate::collaborators::AlertIngestor;
use crate::context::ExecutionContext;

const DEFAULT_PAYLOAD_KEY: &str = "payload";

/// Parses the trigger input into alert and incident records.
///
/// The payload is read from `input[payload_key]` when the trigger input is
/// an object holding that key, otherwise the whole input is the payload.
pub struct IngestNode {
    ingestor: Option<Arc<dyn AlertIngestor>>,
}

impl IngestNode {
    pub fn new(ingestor: Option<Arc<dyn AlertIngestor>>) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl NodeHandler for IngestNode {
    fn node_type(&self) -> &'static str {
        "ingest"
    }

    fn validate_config(&self, config: &NodeConfig) -> Result<(), ConfigFault> {
        optional_str(config, "payload_key")?;
        Ok(())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let ingestor = self
            .ingestor
            .as_ref()
            .ok_or_else(|| NodeError::collaborator("alert ingestion", "no ingestor configured"))?;

        let key = optional_str(config, "payload_key")?.unwrap_or(DEFAULT_PAYLOAD_KEY);
        let payload = context.input.get(key).unwrap_or(&context.input);
        if payload.is_null() {
            return Err(NodeError::collaborator(
                "alert ingestion",
                "trigger input carries no payload",
            ));
        }

        let summary = ingestor
            .ingest(&context.source, payload)
            .await
            .map_err(|e| NodeError::collaborator("alert ingestion", e))?;

        info!(
            created = summary.alerts_created,
            updated = summary.alerts_updated,
            resolved = summary.alerts_resolved,
            incident_id = ?summary.incident_id,
            "alerts ingested"
        );

        serde_json::to_value(&summary).map_err(|e| NodeError::collaborator("alert ingestion", e))
    }
}
