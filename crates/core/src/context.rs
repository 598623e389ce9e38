//! Execution context threaded through one pipeline run.

use serde_json::Value;

/// Correlation identifiers and accumulated node outputs for one run.
///
/// The engine owns the context for the duration of a run. Handlers receive
/// it by shared reference and return their output; only the engine records
/// outputs, so a handler can never alter another node's entry.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Cross-system request identifier. Empty when none applies.
    pub trace_id: String,

    /// Identifier of the run this context belongs to. Empty until the engine
    /// assigns one.
    pub run_id: String,

    /// Originating system, attached to notification metadata.
    pub source: String,

    /// Deployment environment, attached to notification metadata.
    pub environment: String,

    /// Optional triggering incident.
    pub incident_id: Option<String>,

    /// Trigger input, e.g. the inbound alert payload read by ingest nodes.
    pub input: Value,

    /// Node outputs in traversal order.
    outputs: Vec<(String, Value)>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Create an empty context.
    ///
    /// Defaults:
    /// - trace_id / run_id: empty string
    /// - source: "opsline"
    /// - environment: "production"
    /// - input: null
    pub fn new() -> Self {
        Self {
            trace_id: String::new(),
            run_id: String::new(),
            source: "opsline".to_string(),
            environment: "production".to_string(),
            incident_id: None,
            input: Value::Null,
            outputs: Vec::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_incident(mut self, incident_id: impl Into<String>) -> Self {
        self.incident_id = Some(incident_id.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Output recorded for `node_id`, if that node has run successfully.
    pub fn output(&self, node_id: &str) -> Option<&Value> {
        self.outputs
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, value)| value)
    }

    /// All recorded outputs in traversal order.
    pub fn outputs(&self) -> impl DoubleEndedIterator<Item = (&str, &Value)> {
        self.outputs.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Snapshot of the outputs as a JSON object.
    pub fn outputs_json(&self) -> Value {
        Value::Object(
            self.outputs
                .iter()
                .map(|(id, value)| (id.clone(), value.clone()))
                .collect(),
        )
    }

    pub(crate) fn record_output(&mut self, node_id: &str, output: Value) {
        match self.outputs.iter_mut().find(|(id, _)| id == node_id) {
            Some(entry) => entry.1 = output,
            None => self.outputs.push((node_id.to_string(), output)),
        }
    }

    /// Prepare a context for a fresh attempt of run `run_id`: correlation
    /// fields are kept, outputs from any earlier attempt are dropped.
    pub(crate) fn for_attempt(&self, run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            outputs: Vec::new(),
            ..self.clone()
        }
    }
}
