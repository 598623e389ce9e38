//! Stage execution state machine.

use chrono::Utc;
use ol_protocol::{Event, NodeSpec, PipelineRun, StageExecution, StageStatus};
use serde_json::Value;
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

use super::{emit, TransitionError};

/// Create the `pending` stage record for the node at `position` of the
/// run's current attempt.
pub fn create_stage(run: &PipelineRun, position: usize, spec: &NodeSpec, input: Value) -> StageExecution {
    StageExecution {
        id: Uuid::new_v4(),
        run_id: run.id,
        attempt: run.attempt,
        position,
        node_id: spec.id.clone(),
        node_type: spec.node_type.clone(),
        required: spec.required,
        status: StageStatus::Pending,
        input,
        output: None,
        error: None,
        started_at: None,
        completed_at: None,
        duration_ms: None,
    }
}

async fn transition(
    stage: &mut StageExecution,
    to: StageStatus,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    if !stage.status.can_transition_to(to) {
        return Err(TransitionError::Stage {
            node_id: stage.node_id.clone(),
            from: stage.status,
            to,
        });
    }
    stage.status = to;

    let now = Utc::now();
    if to == StageStatus::Running {
        stage.started_at = Some(now);
    } else if to.is_terminal() {
        stage.completed_at = Some(now);
        stage.duration_ms = stage.started_at.map(|started| {
            u64::try_from((now - started).num_milliseconds()).unwrap_or_default()
        });
    }

    emit(
        events,
        Event::StageStatusUpdate {
            run_id: stage.run_id,
            node_id: stage.node_id.clone(),
            status: to,
        },
    )
    .await;
    Ok(())
}

/// `pending → running`.
pub async fn start_stage(
    stage: &mut StageExecution,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(stage, StageStatus::Running, events).await
}

/// `running → succeeded`, capturing the handler's output.
pub async fn succeed_stage(
    stage: &mut StageExecution,
    output: Value,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(stage, StageStatus::Succeeded, events).await?;
    stage.output = Some(output);
    Ok(())
}

/// `running → failed`, capturing the error text.
pub async fn fail_stage(
    stage: &mut StageExecution,
    error: String,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(stage, StageStatus::Failed, events).await?;
    stage.error = Some(error);
    Ok(())
}

/// `pending → skipped`. Only for nodes a required upstream failure kept
/// from starting.
pub async fn skip_stage(
    stage: &mut StageExecution,
    events: Option<&Sender<Event>>,
) -> Result<(), TransitionError> {
    transition(stage, StageStatus::Skipped, events).await
}
