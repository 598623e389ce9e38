use thiserror::Error;

/// Error raised by a node handler's `execute`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("Invalid node config: {0}")]
    InvalidConfig(String),

    #[error("Upstream node '{0}' has no output in this run")]
    MissingUpstream(String),

    #[error("Path '{path}' not found in output of '{source_node}'")]
    PathNotFound { source_node: String, path: String },

    #[error("No checkers could be resolved: {0}")]
    NoCheckers(String),

    #[error("All {0} notification channels failed")]
    AllChannelsFailed(u32),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    #[error("Node timed out after {0}s")]
    Timeout(u64),
}

impl NodeError {
    pub fn collaborator(collaborator: impl Into<String>, message: impl ToString) -> Self {
        NodeError::Collaborator {
            collaborator: collaborator.into(),
            message: message.to_string(),
        }
    }
}
