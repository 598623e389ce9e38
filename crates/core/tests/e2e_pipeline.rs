//! End-to-end tests: full monitoring pipelines over mock collaborators.

mod common;

use common::*;
use ol_core::config::load_config;
use ol_core::state::RunManager;
use ol_core::store::{AuditStore, RunStore};
use ol_core::ExecutionContext;
use ol_protocol::{
    AuditKind, AuditStatus, CheckStatus, ContextOutput, DeliveryStatus, NotifyOutput, RunStatus,
    Severity, StageStatus,
};
use serde_json::json;

fn triage_harness(ai_fails: bool, pager_broken: bool) -> (Harness, std::sync::Arc<MockChannel>) {
    let email = MockChannel::new("email");
    let pager = if pager_broken {
        MockChannel::broken("pager")
    } else {
        MockChannel::new("pager")
    };
    let provider = if ai_fails {
        MockProvider::failing()
    } else {
        MockProvider::succeeding()
    };
    let email_handle = email.clone();

    let h = harness(move |c| {
        c.with_ingestor(std::sync::Arc::new(MockIngestor))
            .with_checker(MockChecker::ok("cpu"))
            .with_checker(MockChecker::with_status("disk", CheckStatus::Warning, "91% used"))
            .with_checker(MockChecker::failing("dns", "resolver timeout"))
            .with_provider(provider)
            .with_channel(email)
            .with_channel(pager)
    });
    (h, email_handle)
}

fn alert_input() -> serde_json::Value {
    json!({"payload": {"alerts": [{"name": "DiskPressure"}, {"name": "DnsFlap"}]}})
}

#[tokio::test]
async fn test_triage_pipeline_end_to_end() {
    let (mut h, email) = triage_harness(false, true);

    let run = h
        .engine
        .execute(
            &monitoring_definition(),
            ExecutionContext::new()
                .with_trace_id("trace-e2e")
                .with_environment("staging")
                .with_input(alert_input()),
        )
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    let stages = h.store.list_stages(run.id, None).await.unwrap();
    assert_stages(
        &stages,
        &[
            ("ingest", StageStatus::Succeeded),
            ("health", StageStatus::Succeeded),
            ("ai", StageStatus::Succeeded),
            ("notify", StageStatus::Succeeded),
        ],
    );

    assert_eq!(stages[0].output.as_ref().unwrap()["alerts_created"], 2);

    let health: ContextOutput = serde_json::from_value(stages[1].output.clone().unwrap()).unwrap();
    assert_eq!(health.results.len(), 3);
    assert_eq!(health.results[2].name, "dns");
    assert_eq!(health.results[2].result.status, CheckStatus::Unknown);

    let notify: NotifyOutput = serde_json::from_value(stages[3].output.clone().unwrap()).unwrap();
    assert_eq!((notify.attempted, notify.succeeded, notify.failed), (2, 1, 1));
    assert_eq!(notify.deliveries[0].status, DeliveryStatus::Delivered);
    assert_eq!(notify.deliveries[1].status, DeliveryStatus::Failed);
    assert_eq!(notify.severity, Severity::Warning);

    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("disk [warning]: 91% used"));
    assert!(sent[0].body.contains("dns [unknown]"));
    assert!(sent[0].body.contains("Clean up /var/log"));
    assert_eq!(sent[0].metadata["trace_id"], "trace-e2e");
    assert_eq!(sent[0].metadata["environment"], "staging");

    // Three checks and one analysis, all correlated with this run.
    let audits = h.store.list_audits().await.unwrap();
    assert_eq!(audits.len(), 4);
    assert!(audits.iter().all(|a| a.run_id == run.id.to_string()));
    assert!(audits.iter().all(|a| a.trace_id == "trace-e2e"));
    assert!(audits.iter().all(|a| a.status.is_terminal()));
    assert_eq!(
        audits.iter().filter(|a| a.kind == AuditKind::Check).count(),
        3
    );

    assert_event_sequence(&drain_events(&mut h.events));
}

#[tokio::test]
async fn test_optional_analysis_failure_does_not_abort() {
    let (h, email) = triage_harness(true, false);

    let run = h
        .engine
        .execute(
            &monitoring_definition(),
            ExecutionContext::new().with_input(alert_input()),
        )
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    let stages = h.store.list_stages(run.id, None).await.unwrap();
    assert_eq!(stages[2].status, StageStatus::Failed);
    assert!(stages[2].error.as_deref().unwrap_or_default().contains("boom"));
    assert_eq!(stages[3].status, StageStatus::Succeeded);

    let sent = email.sent();
    assert!(!sent[0].body.contains("Analysis"));

    let analysis = h
        .store
        .list_audits()
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.kind == AuditKind::Analysis)
        .unwrap();
    assert_eq!(analysis.status, AuditStatus::Failed);
}

#[tokio::test]
async fn test_invalid_alert_payload_aborts_run() {
    let (h, email) = triage_harness(false, false);

    let run = h
        .engine
        .execute(
            &monitoring_definition(),
            ExecutionContext::new().with_input(json!({"payload": {"garbage": true}})),
        )
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.last_error.as_deref().unwrap_or_default().contains("missing 'alerts' list"));
    let stages = h.store.list_stages(run.id, None).await.unwrap();
    assert_stages(
        &stages,
        &[
            ("ingest", StageStatus::Failed),
            ("health", StageStatus::Skipped),
            ("ai", StageStatus::Skipped),
            ("notify", StageStatus::Skipped),
        ],
    );
    assert!(email.sent().is_empty());
    assert!(h.store.list_audits().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_all_channels_failing_fails_required_notify() {
    let email = MockChannel::broken("email");
    let pager = MockChannel::broken("pager");
    let h = harness(move |c| {
        c.with_checker(MockChecker::ok("cpu"))
            .with_channel(email)
            .with_channel(pager)
    });
    let definition = ol_protocol::PipelineDefinition::chained(
        "notify-only",
        1,
        vec![
            ol_protocol::NodeSpec::new("health", "context"),
            ol_protocol::NodeSpec::new("notify", "notify")
                .with_config("channels", json!(["email", "pager"])),
        ],
    );

    let run = h
        .engine
        .execute(&definition, ExecutionContext::new())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let stages = h.store.list_stages(run.id, None).await.unwrap();
    assert_eq!(stages[1].status, StageStatus::Failed);
    assert!(stages[1]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("All 2 notification channels failed"));
}

#[tokio::test]
async fn test_pipeline_loaded_from_project_config() {
    let project = create_test_project().expect("Failed to create test project");
    let config = load_config(project.path()).await.expect("Failed to load config");
    assert_eq!(config.settings.environment, "staging");

    let email = MockChannel::new("email");
    let email_handle = email.clone();
    let h = harness(move |c| {
        c.with_checker(MockChecker::ok("cpu"))
            .with_checker(MockChecker::with_status("disk", CheckStatus::Critical, "99% used"))
            .with_channel(email)
    });
    let engine = h
        .engine
        .clone()
        .with_default_timeout(config.settings.default_timeout().unwrap_or_default());
    let manager = RunManager::new(engine);

    let run = manager
        .start_named(&config, "nightly-health", config.settings.context())
        .await
        .expect("run should start");
    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(run.pipeline_version, 2);

    let stages = manager.stages(run.id, None).await.unwrap();
    assert_eq!(stages[1].output, Some(json!({"ok": 1, "warnings": 0})));

    let sent = email_handle.sent();
    assert_eq!(sent[0].severity, Severity::Critical);
    assert_eq!(sent[0].metadata["source"], "alertmanager");
    assert_eq!(sent[0].metadata["environment"], "staging");

    let missing = manager
        .start_named(&config, "does-not-exist", ExecutionContext::new())
        .await
        .unwrap_err();
    assert!(missing.to_string().contains("does-not-exist"));
}
