//! `context` node: runs health checks and aggregates their results.

use async_trait::async_trait;
use ol_protocol::{CheckCounts, CheckOutcome, ContextOutput, NodeConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::base::{optional_str_list, ConfigFault, NodeHandler};
use super::NodeError;
use crate::audit::{AuditRecorder, Correlation};
use crate::collaborators::{Checker, NamedRegistry};
use crate::context::ExecutionContext;

/// Runs the checkers named in `checks`, or every enabled checker when the
/// key is absent.
///
/// Each checker runs through the audit wrapper with the must-return-a-result
/// policy, so a failing checker shows up as an `unknown` result. The node
/// fails only when no checker could be resolved at all.
pub struct ContextNode {
    checkers: Arc<NamedRegistry<dyn Checker>>,
    audit: AuditRecorder,
}

impl ContextNode {
    pub fn new(checkers: Arc<NamedRegistry<dyn Checker>>, audit: AuditRecorder) -> Self {
        Self { checkers, audit }
    }

    fn resolve(&self, requested: Option<Vec<String>>) -> Vec<Arc<dyn Checker>> {
        match requested {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let checker = self.checkers.get(name);
                    if checker.is_none() {
                        warn!(check = %name, "unknown checker requested, ignoring");
                    }
                    checker
                })
                .collect(),
            None => self
                .checkers
                .iter()
                .filter(|(_, checker)| checker.enabled())
                .map(|(_, checker)| Arc::clone(checker))
                .collect(),
        }
    }
}

#[async_trait]
impl NodeHandler for ContextNode {
    fn node_type(&self) -> &'static str {
        "context"
    }

    fn validate_config(&self, config: &NodeConfig) -> Result<(), ConfigFault> {
        optional_str_list(config, "checks")?;
        Ok(())
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let requested = optional_str_list(config, "checks")?;
        let described = requested
            .as_ref()
            .map(|names| names.join(", "))
            .unwrap_or_else(|| "all enabled".to_string());

        let checkers = self.resolve(requested);
        if checkers.is_empty() {
            return Err(NodeError::NoCheckers(described));
        }

        let mut results = Vec::with_capacity(checkers.len());
        let mut counts = CheckCounts::default();
        for checker in checkers {
            let result = self
                .audit
                .run_check(
                    checker.as_ref(),
                    Correlation::from_context(context),
                    context.incident_id.clone(),
                )
                .await;
            debug!(check = checker.name(), status = ?result.status, "check finished");
            counts.record(result.status);
            results.push(CheckOutcome {
                name: checker.name().to_string(),
                result,
            });
        }

        serde_json::to_value(ContextOutput { results, counts })
            .map_err(|e| NodeError::collaborator("health checks", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CheckError;
    use crate::store::InMemoryStore;
    use ol_protocol::{CheckResult, CheckStatus};
    use serde_json::json;

    struct FixedChecker {
        name: &'static str,
        enabled: bool,
        result: Result<CheckResult, CheckError>,
    }

    #[async_trait]
    impl Checker for FixedChecker {
        fn name(&self) -> &str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn run(&self) -> Result<CheckResult, CheckError> {
            self.result.clone()
        }
    }

    fn checker(name: &'static str, result: Result<CheckResult, CheckError>) -> Arc<dyn Checker> {
        Arc::new(FixedChecker {
            name,
            enabled: true,
            result,
        })
    }

    fn node(checkers: NamedRegistry<dyn Checker>) -> ContextNode {
        ContextNode::new(
            Arc::new(checkers),
            AuditRecorder::new(Arc::new(InMemoryStore::new())),
        )
    }

    #[tokio::test]
    async fn test_failing_checker_becomes_unknown() {
        let checkers = NamedRegistry::new()
            .with("a", checker("a", Ok(CheckResult::new(CheckStatus::Ok, "fine"))))
            .with(
                "b",
                checker("b", Ok(CheckResult::new(CheckStatus::Warning, "high"))),
            )
            .with(
                "c",
                checker("c", Err(CheckError::Failed("probe crashed".to_string()))),
            );

        let output = node(checkers)
            .execute(&NodeConfig::new(), &ExecutionContext::new())
            .await
            .unwrap();
        let output: ContextOutput = serde_json::from_value(output).unwrap();

        assert_eq!(output.results.len(), 3);
        assert_eq!(output.results[2].name, "c");
        assert_eq!(output.results[2].result.status, CheckStatus::Unknown);
        assert!(output.results[2].result.message.contains("probe crashed"));
        assert_eq!(output.counts.unknown, 1);
        assert_eq!(output.counts.warning, 1);
    }

    #[tokio::test]
    async fn test_requested_subset_ignores_unknown_names() {
        let checkers = NamedRegistry::new()
            .with("cpu", checker("cpu", Ok(CheckResult::new(CheckStatus::Ok, "ok"))))
            .with("disk", checker("disk", Ok(CheckResult::new(CheckStatus::Ok, "ok"))));
        let config: NodeConfig =
            serde_json::from_value(json!({"checks": ["disk", "gpu"]})).unwrap();

        let output = node(checkers)
            .execute(&config, &ExecutionContext::new())
            .await
            .unwrap();
        let output: ContextOutput = serde_json::from_value(output).unwrap();
        assert_eq!(output.results.len(), 1);
        assert_eq!(output.results[0].name, "disk");
    }

    #[tokio::test]
    async fn test_fails_when_no_checker_resolves() {
        let checkers = NamedRegistry::new()
            .with("cpu", checker("cpu", Ok(CheckResult::new(CheckStatus::Ok, "ok"))));
        let config: NodeConfig = serde_json::from_value(json!({"checks": ["gpu"]})).unwrap();

        let err = node(checkers)
            .execute(&config, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::NoCheckers(_)));
    }

    #[tokio::test]
    async fn test_disabled_checkers_skipped_by_default() {
        let disabled: Arc<dyn Checker> = Arc::new(FixedChecker {
            name: "mem",
            enabled: false,
            result: Ok(CheckResult::new(CheckStatus::Ok, "ok")),
        });
        let checkers = NamedRegistry::new().with("mem", disabled);

        let err = node(checkers)
            .execute(&NodeConfig::new(), &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::NoCheckers(_)));
    }
}
