//! `notify` node: builds a message from upstream outputs and fans it out.

use async_trait::async_trait;
use ol_protocol::{
    CheckStatus, ContextOutput, DeliveryRecord, DeliveryStatus, IntelligenceOutput, NodeConfig,
    NotificationMessage, NotifyOutput, Severity,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::base::{optional_str, optional_str_list, ConfigFault, NodeHandler};
use super::NodeError;
use crate::collaborators::{ChannelError, NamedRegistry, NotificationChannel};
use crate::context::ExecutionContext;

/// Delivers one message across the channels listed in `channels`.
///
/// Channel failures are recorded per delivery. The node fails only when
/// every attempted channel failed.
pub struct NotifyNode {
    channels: Arc<NamedRegistry<dyn NotificationChannel>>,
}

impl NotifyNode {
    pub fn new(channels: Arc<NamedRegistry<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    async fn deliver(&self, name: &str, message: &NotificationMessage) -> DeliveryRecord {
        let sent = match self.channels.get(name) {
            Some(channel) => channel.send(message).await,
            None => Err(ChannelError::NotConfigured(name.to_string())),
        };

        match sent {
            Ok(message_id) => DeliveryRecord {
                channel: name.to_string(),
                status: DeliveryStatus::Delivered,
                message_id: Some(message_id),
                error: None,
            },
            Err(e) => {
                warn!(channel = name, error = %e, "notification delivery failed");
                DeliveryRecord {
                    channel: name.to_string(),
                    status: DeliveryStatus::Failed,
                    message_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl NodeHandler for NotifyNode {
    fn node_type(&self) -> &'static str {
        "notify"
    }

    fn validate_config(&self, config: &NodeConfig) -> Result<(), ConfigFault> {
        match optional_str_list(config, "channels")? {
            Some(channels) if !channels.is_empty() => {}
            _ => return Err(ConfigFault::MissingKey("channels".to_string())),
        }
        optional_str(config, "source_node")?;
        optional_str(config, "intelligence_node")?;
        Ok(())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let channels = optional_str_list(config, "channels")?.unwrap_or_default();
        if channels.is_empty() {
            return Err(NodeError::InvalidConfig("no channels configured".to_string()));
        }

        let message = build_message(config, context)?;

        let mut deliveries = Vec::with_capacity(channels.len());
        for name in &channels {
            deliveries.push(self.deliver(name, &message).await);
        }

        let attempted = u32::try_from(deliveries.len()).unwrap_or(u32::MAX);
        let succeeded = u32::try_from(
            deliveries
                .iter()
                .filter(|d| d.status == DeliveryStatus::Delivered)
                .count(),
        )
        .unwrap_or(u32::MAX);
        let failed = attempted - succeeded;

        if succeeded == 0 {
            return Err(NodeError::AllChannelsFailed(attempted));
        }
        info!(attempted, succeeded, failed, severity = message.severity.as_str(), "notification sent");

        let output = NotifyOutput {
            severity: message.severity,
            title: message.title,
            attempted,
            succeeded,
            failed,
            deliveries,
        };
        serde_json::to_value(output).map_err(|e| NodeError::collaborator("notification", e))
    }
}

/// Output of `explicit`, or else the most recent output that parses as `T`.
fn upstream<T: DeserializeOwned>(context: &ExecutionContext, explicit: Option<&str>) -> Option<T> {
    match explicit {
        Some(node_id) => context
            .output(node_id)
            .and_then(|value| serde_json::from_value(value.clone()).ok()),
        None => context
            .outputs()
            .rev()
            .find_map(|(_, value)| serde_json::from_value(value.clone()).ok()),
    }
}

fn severity_of(status: CheckStatus) -> Severity {
    match status {
        CheckStatus::Critical => Severity::Critical,
        CheckStatus::Warning | CheckStatus::Unknown => Severity::Warning,
        CheckStatus::Ok => Severity::Info,
    }
}

fn title_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[CRITICAL] Health checks report critical problems",
        Severity::Warning => "[WARNING] Health checks report warnings",
        Severity::Info => "[INFO] All health checks passed",
    }
}

pub(crate) fn build_message(
    config: &NodeConfig,
    context: &ExecutionContext,
) -> Result<NotificationMessage, ConfigFault> {
    let checks: Option<ContextOutput> = upstream(context, optional_str(config, "source_node")?);
    let analysis: Option<IntelligenceOutput> =
        upstream(context, optional_str(config, "intelligence_node")?);

    let metadata = BTreeMap::from([
        ("trace_id".to_string(), context.trace_id.clone()),
        ("source".to_string(), context.source.clone()),
        ("environment".to_string(), context.environment.clone()),
    ]);

    if checks.is_none() && analysis.is_none() {
        let run = if context.run_id.is_empty() {
            "Pipeline run".to_string()
        } else {
            format!("Pipeline run {}", context.run_id)
        };
        return Ok(NotificationMessage {
            severity: Severity::Info,
            title: "Pipeline run completed".to_string(),
            body: format!("{run} completed in {}.", context.environment),
            metadata,
        });
    }

    let severity = checks
        .as_ref()
        .and_then(|c| c.results.iter().map(|o| severity_of(o.result.status)).max())
        .unwrap_or(Severity::Info);

    let mut sections = Vec::new();
    if let Some(checks) = &checks {
        let failing: Vec<String> = checks
            .failing()
            .map(|o| format!("- {} [{}]: {}", o.name, status_label(o.result.status), o.result.message))
            .collect();
        if failing.is_empty() {
            sections.push(format!("All {} checks passed.", checks.results.len()));
        } else {
            sections.push(format!("Failing checks:\n{}", failing.join("\n")));
        }
    }
    if let Some(analysis) = &analysis {
        sections.push(format!("Analysis:\n{}", analysis.summary));
    }

    Ok(NotificationMessage {
        severity,
        title: title_for(severity).to_string(),
        body: sections.join("\n\n"),
        metadata,
    })
}

fn status_label(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Ok => "ok",
        CheckStatus::Warning => "warning",
        CheckStatus::Critical => "critical",
        CheckStatus::Unknown => "unknown",
    }
}
