//! The node-handler contract and helpers for reading node config.

use async_trait::async_trait;
use ol_protocol::NodeConfig;
use serde_json::Value;
use thiserror::Error;

use super::NodeError;
use crate::context::ExecutionContext;

/// A problem with a node's config found before execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigFault {
    #[error("missing required config key '{0}'")]
    MissingKey(String),
    #[error("{0}")]
    Invalid(String),
}

/// One polymorphic node type.
///
/// Handlers are stateless with respect to a run: everything they need
/// arrives through `config` and `context`, and the returned value becomes
/// this node's entry in the context's output map.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Type string used in definitions, e.g. `"notify"`.
    fn node_type(&self) -> &'static str;

    /// Check `config` before any node of the run executes.
    fn validate_config(&self, _config: &NodeConfig) -> Result<(), ConfigFault> {
        Ok(())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError>;
}

/// Optional string entry. A present non-string value is a fault.
pub(crate) fn optional_str<'a>(
    config: &'a NodeConfig,
    key: &str,
) -> Result<Option<&'a str>, ConfigFault> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ConfigFault::Invalid(format!("'{key}' must be a string"))),
    }
}

pub(crate) fn required_str<'a>(config: &'a NodeConfig, key: &str) -> Result<&'a str, ConfigFault> {
    match optional_str(config, key)? {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ConfigFault::MissingKey(key.to_string())),
    }
}

/// Optional list of strings. A single string is accepted as a one-item list.
pub(crate) fn optional_str_list(
    config: &NodeConfig,
    key: &str,
) -> Result<Option<Vec<String>>, ConfigFault> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigFault::Invalid(format!("'{key}' must contain only strings"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ConfigFault::Invalid(format!(
            "'{key}' must be a string or a list of strings"
        ))),
    }
}

impl From<ConfigFault> for NodeError {
    fn from(fault: ConfigFault) -> Self {
        NodeError::InvalidConfig(fault.to_string())
    }
}
