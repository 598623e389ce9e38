//! Deterministic collaborators and node handlers for tests.

use async_trait::async_trait;
use ol_core::collaborators::{
    AlertIngestor, AnalysisProvider, AnalysisRequest, ChannelError, CheckError, Checker,
    IngestError, NotificationChannel, ProviderError,
};
use ol_core::nodes::{NodeError, NodeHandler};
use ol_core::store::{AuditStore, StoreError};
use ol_core::ExecutionContext;
use ol_protocol::{
    AuditRun, CheckResult, CheckStatus, IngestSummary, NodeConfig, NotificationMessage,
    Recommendation,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A checker that returns a fixed result, or fails with `CheckError::Failed`.
#[allow(dead_code)]
pub struct MockChecker {
    pub name: String,
    pub outcome: Result<CheckResult, CheckError>,
    pub config: BTreeMap<String, Value>,
}

#[allow(dead_code)]
impl MockChecker {
    pub fn ok(name: &str) -> Arc<Self> {
        Self::with_status(name, CheckStatus::Ok, "within limits")
    }

    pub fn with_status(name: &str, status: CheckStatus, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(CheckResult::new(status, message)),
            config: BTreeMap::new(),
        })
    }

    pub fn failing(name: &str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(CheckError::Failed(error.to_string())),
            config: BTreeMap::from([
                ("api_token".to_string(), json!("secret-value")),
                ("threshold".to_string(), json!(90)),
            ]),
        })
    }
}

#[async_trait]
impl Checker for MockChecker {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> BTreeMap<String, Value> {
        self.config.clone()
    }

    async fn run(&self) -> Result<CheckResult, CheckError> {
        self.outcome.clone()
    }
}

/// A provider that returns fixed recommendations, or fails with "boom".
/// With a delay it sleeps before answering.
#[allow(dead_code)]
pub struct MockProvider {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-ai"
    }

    fn config(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("api_key".to_string(), json!("sk-live-123")),
            ("model".to_string(), json!("small")),
        ])
    }

    async fn analyze(
        &self,
        _request: &AnalysisRequest,
    ) -> Result<Vec<Recommendation>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ProviderError::ApiError("boom".to_string()));
        }
        Ok(vec![Recommendation {
            kind: "disk".to_string(),
            priority: "high".to_string(),
            title: "Clean up /var/log".to_string(),
            description: "Log volume grows 5% per day".to_string(),
            actions: vec!["logrotate -f /etc/logrotate.conf".to_string()],
        }])
    }
}

/// An ingestor that reports one created alert per entry in `alerts`.
#[allow(dead_code)]
pub struct MockIngestor;

#[async_trait]
impl AlertIngestor for MockIngestor {
    async fn ingest(&self, _source: &str, payload: &Value) -> Result<IngestSummary, IngestError> {
        let alerts = payload
            .get("alerts")
            .and_then(Value::as_array)
            .ok_or_else(|| IngestError::InvalidPayload("missing 'alerts' list".to_string()))?;
        Ok(IngestSummary {
            alerts_created: u32::try_from(alerts.len()).unwrap_or(u32::MAX),
            incident_id: Some("INC-42".to_string()),
            ..Default::default()
        })
    }
}

/// A channel that records what it was asked to send.
#[allow(dead_code)]
pub struct MockChannel {
    pub name: String,
    pub fail: bool,
    pub sent: Mutex<Vec<NotificationMessage>>,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn broken(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &NotificationMessage) -> Result<String, ChannelError> {
        if self.fail {
            return Err(ChannelError::Delivery(format!("{} unreachable", self.name)));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("{}-{}", self.name, sent.len()))
    }
}

/// Node type `static`: returns `config.value` (or `{}`), counting calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct StaticNode {
    pub calls: AtomicUsize,
}

#[async_trait]
impl NodeHandler for StaticNode {
    fn node_type(&self) -> &'static str {
        "static"
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(config.get("value").cloned().unwrap_or_else(|| json!({})))
    }
}

/// Node type `fail`: always fails with `config.message`.
#[allow(dead_code)]
pub struct FailNode;

#[async_trait]
impl NodeHandler for FailNode {
    fn node_type(&self) -> &'static str {
        "fail"
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let message = config
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("scripted failure");
        Err(NodeError::collaborator("fail", message))
    }
}

/// Node type `slow`: sleeps `config.millis` before succeeding.
#[allow(dead_code)]
pub struct SlowNode;

#[async_trait]
impl NodeHandler for SlowNode {
    fn node_type(&self) -> &'static str {
        "slow"
    }

    async fn execute(
        &self,
        config: &NodeConfig,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let millis = config.get("millis").and_then(Value::as_u64).unwrap_or(10_000);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(json!({"slept_ms": millis}))
    }
}

/// Node type `echo_context`: returns the correlation ids and prior outputs it saw.
#[allow(dead_code)]
pub struct EchoContextNode;

#[async_trait]
impl NodeHandler for EchoContextNode {
    fn node_type(&self) -> &'static str {
        "echo_context"
    }

    async fn execute(
        &self,
        _config: &NodeConfig,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        Ok(json!({
            "trace_id": context.trace_id,
            "run_id": context.run_id,
            "seen": context.outputs().map(|(id, _)| id.to_string()).collect::<Vec<_>>(),
        }))
    }
}

/// An audit store that is always down.
#[allow(dead_code)]
pub struct UnavailableAuditStore;

#[async_trait]
impl AuditStore for UnavailableAuditStore {
    async fn create_audit(&self, _record: &AuditRun) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("audit database down".to_string()))
    }

    async fn update_audit(&self, _record: &AuditRun) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("audit database down".to_string()))
    }

    async fn get_audit(&self, id: uuid::Uuid) -> Result<AuditRun, StoreError> {
        Err(StoreError::NotFound(format!("audit {id}")))
    }

    async fn list_audits(&self) -> Result<Vec<AuditRun>, StoreError> {
        Err(StoreError::Unavailable("audit database down".to_string()))
    }
}
