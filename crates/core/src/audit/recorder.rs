use chrono::Utc;
use ol_protocol::{AuditKind, AuditRun, AuditStatus, CheckResult, Recommendation};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::ErrorPolicy;
use crate::collaborators::{AnalysisProvider, AnalysisRequest, Checker, ProviderError};
use crate::context::ExecutionContext;
use crate::redaction::redact_with;
use crate::store::AuditStore;

/// Correlation identifiers attached to an audit record.
///
/// Both fields are empty strings, never absent, when no correlation applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub trace_id: String,
    pub run_id: String,
}

impl Correlation {
    /// No correlation: both identifiers empty.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(trace_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            run_id: run_id.into(),
        }
    }

    pub fn from_context(context: &ExecutionContext) -> Self {
        Self::new(context.trace_id.clone(), context.run_id.clone())
    }
}

/// Description of one instrumented invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub kind: AuditKind,
    pub name: String,
    pub correlation: Correlation,
    pub subject: Option<String>,
    pub config: BTreeMap<String, Value>,
}

impl Invocation {
    pub fn new(kind: AuditKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            correlation: Correlation::none(),
            subject: None,
            config: BTreeMap::new(),
        }
    }

    pub fn with_correlation(mut self, correlation: Correlation) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_config(mut self, config: BTreeMap<String, Value>) -> Self {
        self.config = config;
        self
    }
}

/// Runs units of work and keeps an [`AuditRun`] trail for each invocation.
///
/// Records between `started` and their outcome are tracked in memory. When a
/// caller abandons the work (for example a node timeout drops the future),
/// [`AuditRecorder::fail_in_flight`] closes them as failed.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
    extra_sensitive_keys: Vec<String>,
    in_flight: Arc<Mutex<HashMap<Uuid, AuditRun>>>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            extra_sensitive_keys: Vec::new(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Extend the set of substrings that mark a config key as sensitive.
    pub fn with_sensitive_keys(mut self, keys: Vec<String>) -> Self {
        self.extra_sensitive_keys = keys;
        self
    }

    /// Run `work` with an audit trail, applying `policy` if it fails.
    ///
    /// With [`ErrorPolicy::MustReturnResult`] this never returns `Err`.
    #[instrument(
        name = "audited_run",
        skip_all,
        fields(kind = ?invocation.kind, name = %invocation.name, policy = ?policy)
    )]
    pub async fn run<T, E, F, Fut>(
        &self,
        invocation: Invocation,
        policy: ErrorPolicy<T>,
        work: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let record = self.create_record(invocation).await;
        let record = match record {
            Some(record) => self.mark_started(record).await,
            None => None,
        };

        let started = Instant::now();
        let outcome = work().await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(value) => {
                if let Some(mut record) = record {
                    record.status = AuditStatus::Succeeded;
                    record.result = summarize(&value);
                    self.finish(record, duration_ms).await;
                }
                Ok(value)
            }
            Err(err) => {
                let text = err.to_string();
                if let Some(mut record) = record {
                    record.status = AuditStatus::Failed;
                    record.error = Some(text.clone());
                    self.finish(record, duration_ms).await;
                }
                match policy {
                    ErrorPolicy::MustReturnResult(fallback) => {
                        debug!(error = %text, "unit of work failed, returning fallback result");
                        Ok(fallback(&text))
                    }
                    ErrorPolicy::CallerHandlesErrors => Err(err),
                }
            }
        }
    }

    /// Run a health check. Always yields a result: a failing checker is
    /// reported as [`CheckStatus::Unknown`](ol_protocol::CheckStatus::Unknown).
    pub async fn run_check(
        &self,
        checker: &dyn Checker,
        correlation: Correlation,
        subject: Option<String>,
    ) -> CheckResult {
        let invocation = Invocation::new(AuditKind::Check, checker.name())
            .with_correlation(correlation)
            .with_subject(subject)
            .with_config(checker.config());

        self.run(
            invocation,
            ErrorPolicy::must_return_result(CheckResult::unknown),
            || checker.run(),
        )
        .await
        .unwrap_or_else(|e| CheckResult::unknown(&e.to_string()))
    }

    /// Run an analysis. Provider errors are recorded and returned unchanged.
    pub async fn run_analysis(
        &self,
        provider: &dyn AnalysisProvider,
        request: &AnalysisRequest,
        correlation: Correlation,
    ) -> Result<Vec<Recommendation>, ProviderError> {
        let mut config = provider.config();
        if let Some(analysis_type) = &request.analysis_type {
            config.insert(
                "analysis_type".to_string(),
                Value::String(analysis_type.clone()),
            );
        }
        config.extend(request.params.clone());

        let invocation = Invocation::new(AuditKind::Analysis, provider.name())
            .with_correlation(correlation)
            .with_subject(request.subject.clone())
            .with_config(config);

        self.run(invocation, ErrorPolicy::caller_handles_errors(), || {
            provider.analyze(request)
        })
        .await
    }

    /// Mark every unfinished record of run `run_id` as failed with `error`.
    ///
    /// Returns how many records were closed. Records with an empty run id are
    /// never touched.
    pub async fn fail_in_flight(&self, run_id: &str, error: &str) -> usize {
        if run_id.is_empty() {
            return 0;
        }
        let abandoned: Vec<AuditRun> = {
            let mut in_flight = self.in_flight.lock().await;
            let ids: Vec<Uuid> = in_flight
                .values()
                .filter(|record| record.run_id == run_id)
                .map(|record| record.id)
                .collect();
            ids.iter().filter_map(|id| in_flight.remove(id)).collect()
        };

        let count = abandoned.len();
        for mut record in abandoned {
            let elapsed_ms = record
                .started_at
                .map(|started| (Utc::now() - started).num_milliseconds().max(0))
                .unwrap_or(0);
            record.status = AuditStatus::Failed;
            record.error = Some(error.to_string());
            warn!(audit_id = %record.id, run_id = %run_id, error = %error, "closing abandoned audit record");
            self.write_outcome(&mut record, u64::try_from(elapsed_ms).unwrap_or(0))
                .await;
        }
        count
    }

    async fn create_record(&self, invocation: Invocation) -> Option<AuditRun> {
        let record = AuditRun {
            id: Uuid::new_v4(),
            kind: invocation.kind,
            name: invocation.name,
            status: AuditStatus::Pending,
            subject: invocation.subject,
            trace_id: invocation.correlation.trace_id,
            run_id: invocation.correlation.run_id,
            config: redact_with(&invocation.config, &self.extra_sensitive_keys),
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
        };

        match self.store.create_audit(&record).await {
            Ok(()) => Some(record),
            Err(e) => {
                warn!(error = %e, name = %record.name, "failed to create audit record, continuing without one");
                None
            }
        }
    }

    async fn mark_started(&self, mut record: AuditRun) -> Option<AuditRun> {
        let previous = record.clone();
        record.status = AuditStatus::Started;
        record.started_at = Some(Utc::now());

        let current = match self.store.update_audit(&record).await {
            Ok(()) => record,
            Err(e) => {
                warn!(error = %e, audit_id = %record.id, "failed to mark audit record started");
                previous
            }
        };
        if !current.run_id.is_empty() {
            self.in_flight
                .lock()
                .await
                .insert(current.id, current.clone());
        }
        Some(current)
    }

    async fn finish(&self, mut record: AuditRun, duration_ms: u64) {
        self.write_outcome(&mut record, duration_ms).await;
        self.in_flight.lock().await.remove(&record.id);
    }

    async fn write_outcome(&self, record: &mut AuditRun, duration_ms: u64) {
        record.completed_at = Some(Utc::now());
        record.duration_ms = Some(duration_ms);
        if let Err(e) = self.store.update_audit(record).await {
            warn!(
                error = %e,
                audit_id = %record.id,
                status = ?record.status,
                "failed to complete audit record"
            );
        }
    }
}

fn summarize<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "failed to serialize result summary");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_success_records_summary_and_duration() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        let invocation = Invocation::new(AuditKind::Analysis, "summary")
            .with_correlation(Correlation::new("trace-1", ""))
            .with_config(BTreeMap::from([
                ("api_key".to_string(), json!("sk-123")),
                ("model".to_string(), json!("small")),
            ]));

        let result: Result<u32, String> = recorder
            .run(invocation, ErrorPolicy::caller_handles_errors(), || async {
                Ok(42)
            })
            .await;
        assert_eq!(result, Ok(42));

        let audits = store.list_audits().await.unwrap();
        assert_eq!(audits.len(), 1);
        let record = &audits[0];
        assert_eq!(record.status, AuditStatus::Succeeded);
        assert_eq!(record.result, Some(json!(42)));
        assert_eq!(record.trace_id, "trace-1");
        assert_eq!(record.run_id, "");
        assert_eq!(record.config["api_key"], json!("***"));
        assert_eq!(record.config["model"], json!("small"));
        assert!(record.started_at.is_some());
        assert!(record.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_must_return_result_swallows_error() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        fn fallback(error: &str) -> String {
            format!("fallback: {error}")
        }

        let result: Result<String, String> = recorder
            .run(
                Invocation::new(AuditKind::Check, "cpu"),
                ErrorPolicy::must_return_result(fallback),
                || async { Err("sensor offline".to_string()) },
            )
            .await;

        assert_eq!(result, Ok("fallback: sensor offline".to_string()));
        let record = &store.list_audits().await.unwrap()[0];
        assert_eq!(record.status, AuditStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("sensor offline"));
    }

    #[tokio::test]
    async fn test_extra_sensitive_keys() {
        let store = Arc::new(InMemoryStore::new());
        let recorder =
            AuditRecorder::new(store.clone()).with_sensitive_keys(vec!["dsn".to_string()]);

        let invocation = Invocation::new(AuditKind::Check, "db")
            .with_config(BTreeMap::from([("DSN".to_string(), json!("postgres://"))]));
        let _: Result<(), String> = recorder
            .run(invocation, ErrorPolicy::caller_handles_errors(), || async {
                Ok(())
            })
            .await;

        let record = &store.list_audits().await.unwrap()[0];
        assert_eq!(record.config["DSN"], json!("***"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_work_is_closed_as_failed() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        let invocation = Invocation::new(AuditKind::Analysis, "slow")
            .with_correlation(Correlation::new("trace-1", "run-1"));
        let work = recorder.run(invocation, ErrorPolicy::caller_handles_errors(), || async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok::<_, String>(())
        });
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(1), work).await;
        assert!(outcome.is_err());

        let record = &store.list_audits().await.unwrap()[0];
        assert_eq!(record.status, AuditStatus::Started);

        assert_eq!(recorder.fail_in_flight("other-run", "timed out").await, 0);
        assert_eq!(recorder.fail_in_flight("run-1", "timed out after 1s").await, 1);

        let record = &store.list_audits().await.unwrap()[0];
        assert_eq!(record.status, AuditStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("timed out after 1s"));
        assert!(record.completed_at.is_some());
        assert_eq!(recorder.fail_in_flight("run-1", "again").await, 0);
    }
}
