//! Pipeline definition models.
//!
//! A definition is produced by an external authoring surface and consumed by
//! the engine. It is a named, versioned, ordered chain of node specs; the
//! first spec is the entry point and every other node is reached through a
//! `next` pointer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;

/// Free-form configuration mapping attached to a node.
pub type NodeConfig = BTreeMap<String, Value>;

/// One typed step in a pipeline definition.
///
/// # Example
///
/// ```yaml
/// id: health
/// type: context
/// required: false
/// timeout_secs: 30
/// config:
///   checks: [cpu, disk]
/// next: notify
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct NodeSpec {
    /// Identifier, unique within the definition.
    pub id: String,

    /// Registered node kind (`ingest`, `context`, `intelligence`, `notify`,
    /// `transform`).
    #[serde(rename = "type")]
    pub node_type: String,

    /// Handler-specific configuration.
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub config: NodeConfig,

    /// Successor node id. `None` ends the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// Whether a failure of this node aborts the rest of the chain.
    #[serde(default = "default_required")]
    pub required: bool,

    /// Per-node timeout, greater than zero. Expiry is reported as an ordinary
    /// node failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_required() -> bool {
    true
}

impl NodeSpec {
    /// Create a required node spec with an empty config.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: NodeConfig::new(),
            next: None,
            required: true,
            timeout_secs: None,
        }
    }

    /// Set the successor node.
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Set a single config entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Set the `required` flag.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the per-node timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// A named, versioned chain of node specs.
///
/// # Example
///
/// ```yaml
/// name: disk-triage
/// version: 3
/// nodes:
///   - id: ingest
///     type: ingest
///     next: health
///   - id: health
///     type: context
///     config:
///       checks: [disk]
///     next: notify
///   - id: notify
///     type: notify
///     config:
///       channels: [slack]
///       source_node: health
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineDefinition {
    /// Human-readable name.
    pub name: String,

    /// Definition version. Runs record which version they executed.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Ordered node specs. The first element is the entry point.
    pub nodes: Vec<NodeSpec>,
}

fn default_version() -> u32 {
    1
}

impl PipelineDefinition {
    /// Build a definition from specs in chain order.
    pub fn new(name: impl Into<String>, version: u32, nodes: Vec<NodeSpec>) -> Self {
        Self {
            name: name.into(),
            version,
            nodes,
        }
    }

    /// Build a definition whose nodes form a chain in list order: every
    /// node's `next` is set to the node that follows it.
    pub fn chained(name: impl Into<String>, version: u32, mut nodes: Vec<NodeSpec>) -> Self {
        let ids: Vec<String> = nodes.iter().skip(1).map(|n| n.id.clone()).collect();
        for (node, next) in nodes.iter_mut().zip(ids) {
            node.next = Some(next);
        }
        Self::new(name, version, nodes)
    }

    /// The entry node, if the definition has any nodes.
    pub fn entry(&self) -> Option<&NodeSpec> {
        self.nodes.first()
    }

    /// Look up a node spec by id.
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
