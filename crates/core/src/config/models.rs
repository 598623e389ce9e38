//! Configuration models.

use ol_protocol::PipelineDefinition;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::context::ExecutionContext;

/// Engine settings from `.opsline/config.toml`.
///
/// ```toml
/// environment = "staging"
/// source = "alertmanager"
/// default_node_timeout_secs = 120
/// extra_sensitive_keys = ["dsn", "webhook_url"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Deployment environment attached to notifications.
    pub environment: String,

    /// Originating system attached to notifications.
    pub source: String,

    /// Timeout for nodes that set none. `None` means no timeout.
    pub default_node_timeout_secs: Option<u64>,

    /// Substrings that mark config keys as sensitive, on top of the built-in set.
    pub extra_sensitive_keys: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            source: "opsline".to_string(),
            default_node_timeout_secs: None,
            extra_sensitive_keys: Vec::new(),
        }
    }
}

impl EngineSettings {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_node_timeout_secs.map(Duration::from_secs)
    }

    /// A fresh execution context carrying these settings' source and environment.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new()
            .with_source(self.source.clone())
            .with_environment(self.environment.clone())
    }
}

/// Everything loaded from an `.opsline/` directory.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml`.
    pub settings: EngineSettings,

    /// Definitions from `pipelines/*.yaml`, ordered by file name.
    pub pipelines: Vec<PipelineDefinition>,
}

impl AppConfig {
    /// Look up a loaded definition by name.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineDefinition> {
        self.pipelines.iter().find(|p| p.name == name)
    }
}
