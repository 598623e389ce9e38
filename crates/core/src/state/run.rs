//! Pipeline run state machine.
//!
//! Each function checks the transition against
//! [`RunStatus::can_transition_to`], updates the run in place and publishes
//! the matching events. Persisting the run is the caller's job.

use chrono::Utc;
use ol_protocol::{Event, FailureKind, PipelineDefinition, PipelineRun, RunStatus};
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

use super::{emit, TransitionError};
use crate::context::ExecutionContext;

/// Create a new run in `pending` status, attempt 1.
///
/// # Arguments
///
/// * `definition` - The definition the run executes
/// * `context` - Supplies the trace id and incident reference
pub fn create_run(definition: &PipelineDefinition, context: &ExecutionContext) -> PipelineRun {
    PipelineRun {
        id: Uuid::new_v4(),
        pipeline_name: definition.name.clone(),
        pipeline_version: definition.version,
        status: RunStatus::Pending,
        attempt: 1,
        last_error_kind: None,
        last_error: None,
        trace_id: context.trace_id.clone(),
        incident_id: context.incident_id.clone(),
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    }
}

fn transition(run: &mut PipelineRun, to: RunStatus) -> Result<(), TransitionError> {
    if !run.status.can_transition_to(to) {
        return Err(TransitionError::Run {
            run_id: run.id,
            from: run.status,
            to,
        });
    }
    run.status = to;
    Ok(())
}

async fn emit_status(run: &PipelineRun, events: Option<&Sender<Event>>) {
    emit(
        events,
        Event::RunStatusUpdate {
            run_id: run.id,
            status: run.status,
            attempt: run.attempt,
        },
    )
    .await;
}

/// `pending → running` for the first attempt.
pub async fn start_run(
    run: &mut PipelineRun,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(run, RunStatus::Running)?;
    run.started_at = Some(Utc::now());
    emit(
        events,
        Event::RunStarted {
            run_id: run.id,
            pipeline_name: run.pipeline_name.clone(),
            attempt: run.attempt,
        },
    )
    .await;
    emit_status(run, events).await;
    Ok(())
}

/// `running → succeeded`.
pub async fn complete_run(
    run: &mut PipelineRun,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(run, RunStatus::Succeeded)?;
    run.completed_at = Some(Utc::now());
    emit_status(run, events).await;
    emit(events, Event::RunCompleted { run_id: run.id }).await;
    Ok(())
}

/// `running → failed`, recording the last-error classification.
///
/// # Arguments
///
/// * `run` - The run to fail
/// * `kind` - Classification of the failure
/// * `error` - Message describing the failure
/// * `events` - Optional channel for lifecycle events
pub async fn fail_run(
    run: &mut PipelineRun,
    kind: FailureKind,
    error: String,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(run, RunStatus::Failed)?;
    run.completed_at = Some(Utc::now());
    run.last_error_kind = Some(kind);
    run.last_error = Some(error.clone());
    emit_status(run, events).await;
    emit(
        events,
        Event::RunFailed {
            run_id: run.id,
            kind,
            error,
        },
    )
    .await;
    Ok(())
}

/// `failed → retrying`. Only an operator action or a retry sweep calls this.
pub async fn mark_retrying(
    run: &mut PipelineRun,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(run, RunStatus::Retrying)?;
    emit_status(run, events).await;
    Ok(())
}

/// `retrying → running` for a fresh attempt: the attempt counter moves up by
/// exactly one and the previous attempt's outcome is cleared.
pub async fn begin_attempt(
    run: &mut PipelineRun,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(run, RunStatus::Running)?;
    run.attempt += 1;
    run.started_at = Some(Utc::now());
    run.completed_at = None;
    run.last_error_kind = None;
    run.last_error = None;
    emit(
        events,
        Event::RunStarted {
            run_id: run.id,
            pipeline_name: run.pipeline_name.clone(),
            attempt: run.attempt,
        },
    )
    .await;
    emit_status(run, events).await;
    Ok(())
}
