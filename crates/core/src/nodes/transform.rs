//! `transform` node: reshapes one upstream node's output.
//!
//! Paths are dot separated; numeric segments index into lists
//! (`results.0.status`). An empty path selects the whole document.

use async_trait::async_trait;
use ol_protocol::NodeConfig;
use serde_json::{Map, Value};

use super::base::{optional_str, optional_str_list, required_str, ConfigFault, NodeHandler};
use super::NodeError;
use crate::context::ExecutionContext;

const DEFAULT_PRIORITY_FIELD: &str = "priority";

/// The three supported reshaping operations.
#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Extract(String),
    Map(Vec<(String, String)>),
    FilterPriority {
        priorities: Vec<String>,
        list_path: String,
        priority_field: String,
    },
}

impl Operation {
    fn parse(config: &NodeConfig) -> Result<Self, ConfigFault> {
        let mut operations = Vec::new();

        if let Some(path) = optional_str(config, "path")? {
            operations.push(Operation::Extract(path.to_string()));
        }

        match config.get("mapping") {
            None | Some(Value::Null) => {}
            Some(Value::Object(fields)) => {
                let fields = fields
                    .iter()
                    .map(|(field, path)| match path {
                        Value::String(path) => Ok((field.clone(), path.clone())),
                        _ => Err(ConfigFault::Invalid(format!(
                            "mapping for '{field}' must be a path string"
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                operations.push(Operation::Map(fields));
            }
            Some(_) => {
                return Err(ConfigFault::Invalid("'mapping' must be an object".to_string()));
            }
        }

        if let Some(priorities) = optional_str_list(config, "filter_priority")? {
            operations.push(Operation::FilterPriority {
                priorities,
                list_path: optional_str(config, "list_path")?.unwrap_or_default().to_string(),
                priority_field: optional_str(config, "priority_field")?
                    .unwrap_or(DEFAULT_PRIORITY_FIELD)
                    .to_string(),
            });
        }

        match operations.len() {
            1 => Ok(operations.remove(0)),
            0 => Err(ConfigFault::MissingKey(
                "path | mapping | filter_priority".to_string(),
            )),
            _ => Err(ConfigFault::Invalid(
                "exactly one of 'path', 'mapping' or 'filter_priority' may be set".to_string(),
            )),
        }
    }
}

/// Resolve a dot path inside `value`.
pub(crate) fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Pure reshaping of the output named by `source`. Never calls out.
pub struct TransformNode;

#[async_trait]
impl NodeHandler for TransformNode {
    fn node_type(&self) -> &'static str {
        "transform"
    }

    fn validate_config(&self, config: &NodeConfig) -> Result<(), ConfigFault> {
        required_str(config, "source")?;
        Operation::parse(config).map(|_| ())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let source = required_str(config, "source")?;
        let operation = Operation::parse(config)?;
        let input = context
            .output(source)
            .ok_or_else(|| NodeError::MissingUpstream(source.to_string()))?;

        let lookup = |path: &str| {
            resolve_path(input, path).ok_or_else(|| NodeError::PathNotFound {
                source_node: source.to_string(),
                path: path.to_string(),
            })
        };

        match operation {
            Operation::Extract(path) => lookup(&path).cloned(),
            Operation::Map(fields) => {
                let mut mapped = Map::new();
                for (field, path) in fields {
                    mapped.insert(field, lookup(&path)?.clone());
                }
                Ok(Value::Object(mapped))
            }
            Operation::FilterPriority {
                priorities,
                list_path,
                priority_field,
            } => {
                let items = lookup(&list_path)?.as_array().ok_or_else(|| {
                    NodeError::InvalidConfig(format!(
                        "'{list_path}' in output of '{source}' is not a list"
                    ))
                })?;
                let kept = items
                    .iter()
                    .filter(|item| {
                        item.get(&priority_field)
                            .and_then(Value::as_str)
                            .is_some_and(|p| priorities.iter().any(|want| want.eq_ignore_ascii_case(p)))
                    })
                    .cloned()
                    .collect();
                Ok(Value::Array(kept))
            }
        }
    }
}
