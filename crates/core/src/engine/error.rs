use thiserror::Error;

use crate::state::TransitionError;
use crate::store::StoreError;

/// One problem found while validating a definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationIssue {
    #[error("definition has no nodes")]
    EmptyDefinition,

    #[error("node '{node_id}' has unknown type '{node_type}'")]
    UnknownNodeType { node_id: String, node_type: String },

    #[error("node id '{node_id}' is used more than once")]
    DuplicateNodeId { node_id: String },

    #[error("node '{node_id}' points to missing node '{next}'")]
    DanglingNext { node_id: String, next: String },

    #[error("node '{node_id}' closes a cycle back to '{next}'")]
    Cycle { node_id: String, next: String },

    #[error("node '{node_id}' is missing required config key '{key}'")]
    MissingConfigKey { node_id: String, key: String },

    #[error("node '{node_id}' has invalid config: {reason}")]
    InvalidConfig { node_id: String, reason: String },
}

/// Error type for the executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The definition failed validation. No run was started.
    #[error("definition '{pipeline}' is invalid: {}", join_issues(.issues))]
    Configuration {
        pipeline: String,
        issues: Vec<ConfigurationIssue>,
    },

    /// A retry was requested with a definition other than the one the run executed.
    #[error("run {run_id} executed '{expected}', not '{actual}'")]
    DefinitionMismatch {
        run_id: uuid::Uuid,
        expected: String,
        actual: String,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid status transition: {0}")]
    Transition(#[from] TransitionError),
}

fn join_issues(issues: &[ConfigurationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
