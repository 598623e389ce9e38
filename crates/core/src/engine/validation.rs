//! Definition validation, run before any record is created.

use ol_protocol::{NodeSpec, PipelineDefinition};
use std::collections::HashSet;
use tracing::warn;

use super::{ConfigurationIssue, EngineError};
use crate::nodes::{ConfigFault, NodeRegistry};

/// Validate `definition` against `registry` and return its chain in
/// traversal order.
///
/// Every issue found is reported, not only the first.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] if any node has an unknown type,
/// an id is duplicated, a `next` points nowhere, the chain loops back on
/// itself, a timeout is zero, or a handler rejects its node's config.
pub fn validate<'a>(
    definition: &'a PipelineDefinition,
    registry: &NodeRegistry,
) -> Result<Vec<&'a NodeSpec>, EngineError> {
    let mut issues = Vec::new();

    if definition.nodes.is_empty() {
        issues.push(ConfigurationIssue::EmptyDefinition);
    }

    let mut seen = HashSet::new();
    for spec in &definition.nodes {
        if !seen.insert(spec.id.as_str()) {
            issues.push(ConfigurationIssue::DuplicateNodeId {
                node_id: spec.id.clone(),
            });
        }

        match registry.get(&spec.node_type) {
            None => issues.push(ConfigurationIssue::UnknownNodeType {
                node_id: spec.id.clone(),
                node_type: spec.node_type.clone(),
            }),
            Some(handler) => match handler.validate_config(&spec.config) {
                Ok(()) => {}
                Err(ConfigFault::MissingKey(key)) => {
                    issues.push(ConfigurationIssue::MissingConfigKey {
                        node_id: spec.id.clone(),
                        key,
                    })
                }
                Err(ConfigFault::Invalid(reason)) => {
                    issues.push(ConfigurationIssue::InvalidConfig {
                        node_id: spec.id.clone(),
                        reason,
                    })
                }
            },
        }

        if spec.timeout_secs == Some(0) {
            issues.push(ConfigurationIssue::InvalidConfig {
                node_id: spec.id.clone(),
                reason: "timeout_secs must be greater than zero".to_string(),
            });
        }

        if let Some(next) = &spec.next {
            if definition.node(next).is_none() {
                issues.push(ConfigurationIssue::DanglingNext {
                    node_id: spec.id.clone(),
                    next: next.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        match walk(definition) {
            Ok(chain) => {
                if chain.len() < definition.nodes.len() {
                    let reached: HashSet<&str> = chain.iter().map(|n| n.id.as_str()).collect();
                    for spec in &definition.nodes {
                        if !reached.contains(spec.id.as_str()) {
                            warn!(pipeline = %definition.name, node_id = %spec.id, "node is unreachable from the entry node");
                        }
                    }
                }
                return Ok(chain);
            }
            Err(issue) => issues.push(issue),
        }
    }

    Err(EngineError::Configuration {
        pipeline: definition.name.clone(),
        issues,
    })
}

/// Follow `next` pointers from the entry node. Assumes ids are unique and
/// every `next` resolves.
fn walk(definition: &PipelineDefinition) -> Result<Vec<&NodeSpec>, ConfigurationIssue> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = definition.entry();

    while let Some(spec) = current {
        visited.insert(spec.id.as_str());
        chain.push(spec);
        current = match &spec.next {
            Some(next) if visited.contains(next.as_str()) => {
                return Err(ConfigurationIssue::Cycle {
                    node_id: spec.id.clone(),
                    next: next.clone(),
                });
            }
            Some(next) => definition.node(next),
            None => None,
        };
    }

    Ok(chain)
}
