//! Pipeline execution engine.
//!
//! The [`PipelineEngine`] validates a definition, walks its chain of nodes
//! one at a time, keeps a stage record per visited node, applies each
//! node's `required` policy and drives the run state machine.

mod error;
mod validation;

pub use error::{ConfigurationIssue, EngineError};
pub use validation::validate;

use ol_protocol::{Event, FailureKind, NodeSpec, PipelineDefinition, PipelineRun, RunStatus};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::nodes::{NodeError, NodeRegistry};
use crate::redaction::redact_nested;
use crate::state::{
    begin_attempt, complete_run, create_run, create_stage, fail_run, fail_stage, skip_stage,
    start_run, start_stage, succeed_stage,
};
use crate::store::{RunStore, StoreError};

/// Why an attempt stopped before the end of the chain.
struct Abort {
    kind: FailureKind,
    message: String,
}

/// The node-graph executor.
///
/// Runs are strictly sequential within themselves. Distinct runs may share
/// one engine and execute concurrently; they only meet in the store.
#[derive(Clone)]
pub struct PipelineEngine {
    registry: NodeRegistry,
    store: Arc<dyn RunStore>,
    events: Option<Sender<Event>>,
    default_timeout: Option<Duration>,
    sensitive_keys: Vec<String>,
}

impl PipelineEngine {
    /// Create a new engine.
    ///
    /// # Arguments
    ///
    /// * `registry` - Handlers for every node type the engine accepts
    /// * `store` - Where run and stage records are persisted
    pub fn new(registry: NodeRegistry, store: Arc<dyn RunStore>) -> Self {
        Self {
            registry,
            store,
            events: None,
            default_timeout: None,
            sensitive_keys: Vec::new(),
        }
    }

    /// Publish lifecycle events on `events_tx`.
    pub fn with_events(mut self, events_tx: Sender<Event>) -> Self {
        self.events = Some(events_tx);
        self
    }

    /// Timeout for nodes that do not set `timeout_secs`.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Extra substrings marking config keys to mask in stage input snapshots.
    pub fn with_sensitive_keys(mut self, keys: Vec<String>) -> Self {
        self.sensitive_keys = keys;
        self
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn store(&self) -> Arc<dyn RunStore> {
        Arc::clone(&self.store)
    }

    /// Validate `definition` without executing it.
    pub fn validate(&self, definition: &PipelineDefinition) -> Result<(), EngineError> {
        validate(definition, &self.registry).map(|_| ())
    }

    /// Execute a definition as a new run and return the final run record.
    ///
    /// A handler failure is not an `Err`: it is recorded on the stage and,
    /// for required nodes, ends the run `failed` with its last-error
    /// classification set.
    ///
    /// # Arguments
    ///
    /// * `definition` - The definition to execute
    /// * `context` - Correlation ids and trigger input for the run
    ///
    /// # Errors
    ///
    /// - [`EngineError::Configuration`] if the definition is invalid; no run is created
    /// - [`EngineError::Store`] if a run or stage record cannot be written
    #[instrument(skip_all, fields(pipeline = %definition.name, trace_id = %context.trace_id))]
    pub async fn execute(
        &self,
        definition: &PipelineDefinition,
        context: ExecutionContext,
    ) -> Result<PipelineRun, EngineError> {
        let chain = validate(definition, &self.registry)?;

        let mut run = create_run(definition, &context);
        self.store.create_run(&run).await?;

        start_run(&mut run, self.events.as_ref()).await?;
        self.store.update_run(&run).await?;

        self.run_attempt(&chain, &mut run, &context).await?;
        Ok(run)
    }

    /// Re-execute a run that an operator moved to `retrying`.
    ///
    /// The attempt counter goes up by one and the whole chain runs again
    /// from the entry node with fresh stage records. Records of earlier
    /// attempts are left untouched.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Transition`] if the run is not `retrying`
    /// - [`EngineError::Store`] with [`StoreError::Conflict`] if another
    ///   attempt claimed the run first
    #[instrument(skip_all, fields(run_id = %run_id, trace_id = %context.trace_id))]
    pub async fn retry(
        &self,
        run_id: Uuid,
        definition: &PipelineDefinition,
        context: ExecutionContext,
    ) -> Result<PipelineRun, EngineError> {
        let chain = validate(definition, &self.registry)?;

        let mut run = self.store.get_run(run_id).await?;
        if run.pipeline_name != definition.name {
            return Err(EngineError::DefinitionMismatch {
                run_id,
                expected: run.pipeline_name,
                actual: definition.name.clone(),
            });
        }

        begin_attempt(&mut run, self.events.as_ref()).await?;
        self.store.update_run_if(&run, RunStatus::Retrying).await?;

        self.run_attempt(&chain, &mut run, &context).await?;
        Ok(run)
    }

    /// Walk the chain for the run's current attempt and finalize the run.
    async fn run_attempt(
        &self,
        chain: &[&NodeSpec],
        run: &mut PipelineRun,
        context: &ExecutionContext,
    ) -> Result<(), EngineError> {
        info!(
            run_id = %run.id,
            attempt = run.attempt,
            nodes = chain.len(),
            "run attempt started"
        );
        let mut context = context.for_attempt(&run.id.to_string());

        let abort = match self.walk(chain, run, &mut context).await {
            Ok(abort) => abort,
            Err(e) => {
                error!(run_id = %run.id, error = %e, "failed to persist stage record");
                let message = format!("failed to persist stage record: {e}");
                fail_run(run, FailureKind::Persistence, message, self.events.as_ref()).await?;
                if let Err(update_err) = self.store.update_run(run).await {
                    warn!(run_id = %run.id, error = %update_err, "failed to persist run failure");
                }
                return Err(e.into());
            }
        };

        match abort {
            None => {
                complete_run(run, self.events.as_ref()).await?;
                info!(run_id = %run.id, attempt = run.attempt, "run succeeded");
            }
            Some(Abort { kind, message }) => {
                warn!(run_id = %run.id, attempt = run.attempt, kind = ?kind, error = %message, "run failed");
                fail_run(run, kind, message, self.events.as_ref()).await?;
            }
        }
        self.store.update_run(run).await?;
        Ok(())
    }

    async fn walk(
        &self,
        chain: &[&NodeSpec],
        run: &PipelineRun,
        context: &mut ExecutionContext,
    ) -> Result<Option<Abort>, StoreError> {
        let events = self.events.as_ref();
        let mut abort: Option<Abort> = None;

        for (position, spec) in chain.iter().enumerate() {
            let mut stage = create_stage(run, position, spec, self.input_snapshot(spec));
            self.store.create_stage(&stage).await?;

            if abort.is_some() {
                transition_or_log(skip_stage(&mut stage, events).await);
                self.store.update_stage(&stage).await?;
                continue;
            }

            transition_or_log(start_stage(&mut stage, events).await);
            self.store.update_stage(&stage).await?;

            match self.execute_node(spec, context).await {
                Ok(output) => {
                    context.record_output(&spec.id, output.clone());
                    transition_or_log(succeed_stage(&mut stage, output, events).await);
                }
                Err(e) => {
                    let message = format!("node '{}' failed: {e}", spec.id);
                    transition_or_log(fail_stage(&mut stage, e.to_string(), events).await);
                    if spec.required {
                        abort = Some(Abort {
                            kind: failure_kind(&e),
                            message,
                        });
                    } else {
                        warn!(
                            run_id = %run.id,
                            node_id = %spec.id,
                            error = %e,
                            "optional node failed, continuing"
                        );
                    }
                }
            }
            self.store.update_stage(&stage).await?;
        }

        Ok(abort)
    }

    #[instrument(
        name = "node",
        skip_all,
        fields(node_id = %spec.id, node_type = %spec.node_type, run_id = %context.run_id)
    )]
    async fn execute_node(
        &self,
        spec: &NodeSpec,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let handler = self.registry.get(&spec.node_type).ok_or_else(|| {
            NodeError::InvalidConfig(format!("no handler for type '{}'", spec.node_type))
        })?;

        let timeout = spec
            .timeout_secs
            .map(Duration::from_secs)
            .or(self.default_timeout);

        let result = match timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, handler.execute(&spec.config, context)).await {
                    Ok(result) => result,
                    Err(_) => {
                        let err = NodeError::Timeout(limit.as_secs());
                        if let Some(audit) = self.registry.audit() {
                            audit
                                .fail_in_flight(&context.run_id, &err.to_string())
                                .await;
                        }
                        Err(err)
                    }
                }
            }
            None => handler.execute(&spec.config, context).await,
        };

        match &result {
            Ok(_) => info!("node succeeded"),
            Err(e) => warn!(error = %e, required = spec.required, "node failed"),
        }
        result
    }

    fn input_snapshot(&self, spec: &NodeSpec) -> Value {
        Value::Object(
            redact_nested(&spec.config, &self.sensitive_keys)
                .into_iter()
                .collect(),
        )
    }
}

fn failure_kind(error: &NodeError) -> FailureKind {
    match error {
        NodeError::Timeout(_) => FailureKind::Timeout,
        _ => FailureKind::NodeExecution,
    }
}

/// Stage transitions in the walk follow a fixed order; a rejected one is logged.
fn transition_or_log(result: Result<(), crate::state::TransitionError>) {
    if let Err(e) = result {
        error!(error = %e, "unexpected stage transition");
    }
}
