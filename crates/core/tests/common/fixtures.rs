//! Test fixtures: engines wired to mocks, definitions and sample projects.

use ol_core::audit::AuditRecorder;
use ol_core::nodes::{Collaborators, NodeRegistry};
use ol_core::store::InMemoryStore;
use ol_core::PipelineEngine;
use ol_protocol::{Event, NodeSpec, PipelineDefinition};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::mock_collaborators::{EchoContextNode, FailNode, SlowNode, StaticNode};

/// An engine over an in-memory store with its event receiver.
#[allow(dead_code)]
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub engine: PipelineEngine,
    pub events: mpsc::Receiver<Event>,
    pub static_node: Arc<StaticNode>,
}

/// Engine with the built-in node types plus the `static`, `fail`, `slow`
/// and `echo_context` test types.
#[allow(dead_code)]
pub fn harness(configure: impl FnOnce(Collaborators) -> Collaborators) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let collaborators = configure(Collaborators::new(AuditRecorder::new(store.clone())));
    let static_node = Arc::new(StaticNode::default());

    let registry = NodeRegistry::builtin(collaborators)
        .with_handler(static_node.clone())
        .with_handler(Arc::new(FailNode))
        .with_handler(Arc::new(SlowNode))
        .with_handler(Arc::new(EchoContextNode));

    let (tx, rx) = mpsc::channel(256);
    let engine = PipelineEngine::new(registry, store.clone()).with_events(tx);

    Harness {
        store,
        engine,
        events: rx,
        static_node,
    }
}

/// A `static` node returning `{"node": id}`.
#[allow(dead_code)]
pub fn static_node(id: &str) -> NodeSpec {
    NodeSpec::new(id, "static").with_config("value", json!({ "node": id }))
}

/// A `fail` node failing with `message`.
#[allow(dead_code)]
pub fn fail_node(id: &str, message: &str) -> NodeSpec {
    NodeSpec::new(id, "fail").with_config("message", json!(message))
}

/// A definition of `n` chained `static` nodes named `n1..nN`.
#[allow(dead_code)]
pub fn static_chain(n: usize) -> PipelineDefinition {
    let nodes = (1..=n).map(|i| static_node(&format!("n{i}"))).collect();
    PipelineDefinition::chained("static-chain", 1, nodes)
}

/// The canonical monitoring definition: ingest, health checks, analysis
/// (optional) and notification.
#[allow(dead_code)]
pub fn monitoring_definition() -> PipelineDefinition {
    PipelineDefinition::chained(
        "incident-triage",
        1,
        vec![
            NodeSpec::new("ingest", "ingest"),
            NodeSpec::new("health", "context").with_config("checks", json!(["cpu", "disk", "dns"])),
            NodeSpec::new("ai", "intelligence")
                .with_config("analysis_type", json!("disk"))
                .with_required(false),
            NodeSpec::new("notify", "notify")
                .with_config("channels", json!(["email", "pager"]))
                .with_config("source_node", json!("health"))
                .with_config("intelligence_node", json!("ai")),
        ],
    )
}

/// Create a temporary project directory with `.opsline/` configuration.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join(".opsline/pipelines"))?;
    std::fs::write(
        root.join(".opsline/config.toml"),
        "environment = \"staging\"\nsource = \"alertmanager\"\ndefault_node_timeout_secs = 5\nextra_sensitive_keys = [\"dsn\"]\n",
    )?;

    let pipeline_yaml = r#"
name: nightly-health
version: 2
nodes:
  - id: health
    type: context
    config:
      checks: [cpu, disk]
    next: digest
  - id: digest
    type: transform
    config:
      source: health
      mapping:
        ok: counts.ok
        warnings: counts.warning
    next: notify
  - id: notify
    type: notify
    config:
      channels: [email]
      source_node: health
"#;
    std::fs::write(root.join(".opsline/pipelines/nightly.yaml"), pipeline_yaml)?;

    Ok(temp_dir)
}
