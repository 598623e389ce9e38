//! Resolves definition type strings to node handlers.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ContextNode, IngestNode, IntelligenceNode, NodeHandler, NotifyNode, TransformNode};
use crate::audit::AuditRecorder;
use crate::collaborators::{
    AlertIngestor, AnalysisProvider, Checker, NamedRegistry, NotificationChannel,
};

/// External collaborators the built-in node types delegate to.
pub struct Collaborators {
    pub ingestor: Option<Arc<dyn AlertIngestor>>,
    pub checkers: NamedRegistry<dyn Checker>,
    pub providers: NamedRegistry<dyn AnalysisProvider>,
    pub channels: NamedRegistry<dyn NotificationChannel>,
    pub audit: AuditRecorder,
}

impl Collaborators {
    /// No collaborators, auditing into `audit`.
    pub fn new(audit: AuditRecorder) -> Self {
        Self {
            ingestor: None,
            checkers: NamedRegistry::new(),
            providers: NamedRegistry::new(),
            channels: NamedRegistry::new(),
            audit,
        }
    }

    pub fn with_ingestor(mut self, ingestor: Arc<dyn AlertIngestor>) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    pub fn with_checker(mut self, checker: Arc<dyn Checker>) -> Self {
        self.checkers.register(checker.name().to_string(), checker);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.providers.register(provider.name().to_string(), provider);
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.register(channel.name().to_string(), channel);
        self
    }
}

/// Registry of node handlers keyed by type string.
///
/// Definitions are validated against this registry before execution, so
/// an unknown type never reaches the executor's walk.
#[derive(Default, Clone)]
pub struct NodeRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
    audit: Option<AuditRecorder>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five built-in node types wired to `collaborators`.
    pub fn builtin(collaborators: Collaborators) -> Self {
        let Collaborators {
            ingestor,
            checkers,
            providers,
            channels,
            audit,
        } = collaborators;

        let mut registry = Self::new()
            .with_handler(Arc::new(IngestNode::new(ingestor)))
            .with_handler(Arc::new(ContextNode::new(Arc::new(checkers), audit.clone())))
            .with_handler(Arc::new(IntelligenceNode::new(
                Arc::new(providers),
                audit.clone(),
            )))
            .with_handler(Arc::new(NotifyNode::new(Arc::new(channels))))
            .with_handler(Arc::new(TransformNode));
        registry.audit = Some(audit);
        registry
    }

    /// Recorder shared by the audited handlers, if the registry has one.
    pub fn audit(&self) -> Option<&AuditRecorder> {
        self.audit.as_ref()
    }

    /// Register a handler under its own type string, replacing any previous one.
    ///
    /// # Arguments
    ///
    /// * `handler` - The handler to register
    pub fn register(&mut self, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(handler.node_type().to_string(), handler);
    }

    pub fn with_handler(mut self, handler: Arc<dyn NodeHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Look up the handler for `node_type`.
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(node_type).cloned()
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }

    /// Registered type strings, sorted.
    pub fn node_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn test_builtin_registers_all_types() {
        let audit = AuditRecorder::new(Arc::new(InMemoryStore::new()));
        let registry = NodeRegistry::builtin(Collaborators::new(audit));

        assert_eq!(
            registry.node_types(),
            vec!["context", "ingest", "intelligence", "notify", "transform"]
        );
        assert!(registry.get("transform").is_some());
        assert!(!registry.contains("webhook"));
        assert!(registry.audit().is_some());
        assert!(NodeRegistry::new().audit().is_none());
    }
}
