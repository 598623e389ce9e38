//! `intelligence` node: asks an analysis provider for recommendations.

use async_trait::async_trait;
use ol_protocol::{IntelligenceOutput, NodeConfig, Recommendation};
use serde_json::Value;
use std::sync::Arc;

use super::base::{optional_str, ConfigFault, NodeHandler};
use super::NodeError;
use crate::audit::{AuditRecorder, Correlation};
use crate::collaborators::{AnalysisProvider, AnalysisRequest, NamedRegistry};
use crate::context::ExecutionContext;

/// Invokes a provider through the audit wrapper under the
/// caller-handles-errors policy. Provider errors fail the node; whether that
/// aborts the run is decided by the node's `required` flag.
///
/// Config keys, all optional:
/// - `provider`: registered provider name, defaults to the first registered
/// - `analysis_type`: e.g. `"disk"` for a targeted analysis
/// - `subject`: defaults to the run's incident id
/// - `params`: object of auxiliary parameters for targeted analyses
pub struct IntelligenceNode {
    providers: Arc<NamedRegistry<dyn AnalysisProvider>>,
    audit: AuditRecorder,
}

impl IntelligenceNode {
    pub fn new(providers: Arc<NamedRegistry<dyn AnalysisProvider>>, audit: AuditRecorder) -> Self {
        Self { providers, audit }
    }

    fn request(config: &NodeConfig, context: &ExecutionContext) -> Result<AnalysisRequest, ConfigFault> {
        let mut request = AnalysisRequest::new();
        request.subject = optional_str(config, "subject")?
            .map(str::to_string)
            .or_else(|| context.incident_id.clone());
        request.analysis_type = optional_str(config, "analysis_type")?.map(str::to_string);
        match config.get("params") {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) => {
                request.params = params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            }
            Some(_) => return Err(ConfigFault::Invalid("'params' must be an object".to_string())),
        }
        Ok(request)
    }
}

#[async_trait]
impl NodeHandler for IntelligenceNode {
    fn node_type(&self) -> &'static str {
        "intelligence"
    }

    fn validate_config(&self, config: &NodeConfig) -> Result<(), ConfigFault> {
        optional_str(config, "provider")?;
        Self::request(config, &ExecutionContext::new()).map(|_| ())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let provider = match optional_str(config, "provider")? {
            Some(name) => self.providers.get(name).ok_or_else(|| {
                NodeError::collaborator("analysis", format!("provider '{name}' is not registered"))
            })?,
            None => self
                .providers
                .iter()
                .next()
                .map(|(_, provider)| Arc::clone(provider))
                .ok_or_else(|| NodeError::collaborator("analysis", "no provider registered"))?,
        };

        let request = Self::request(config, context)?;
        let recommendations = self
            .audit
            .run_analysis(provider.as_ref(), &request, Correlation::from_context(context))
            .await
            .map_err(|e| NodeError::collaborator(provider.name(), e))?;

        let output = IntelligenceOutput {
            provider: provider.name().to_string(),
            analysis_type: request.analysis_type,
            count: u32::try_from(recommendations.len()).unwrap_or(u32::MAX),
            summary: summarize(&recommendations),
            recommendations,
        };
        serde_json::to_value(output).map_err(|e| NodeError::collaborator("analysis", e))
    }
}

/// One line per recommendation, highest priority first as returned.
fn summarize(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "No recommendations.".to_string();
    }
    recommendations
        .iter()
        .map(|r| format!("[{}] {}: {}", r.priority, r.title, r.description))
        .collect::<Vec<_>>()
        .join("\n")
}
