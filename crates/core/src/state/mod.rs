//! Run and stage state management.
//!
//! This module provides:
//! - The run state machine ([`run`])
//! - The stage state machine ([`stage`])
//! - [`RunManager`] for starting runs and handling retries

pub mod manager;
pub mod run;
pub mod stage;

pub use manager::RunManager;
pub use run::{begin_attempt, complete_run, create_run, fail_run, mark_retrying, start_run};
pub use stage::{create_stage, fail_stage, skip_stage, start_stage, succeed_stage};

use ol_protocol::{Event, RunStatus, StageStatus};
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

/// A status change the state machine does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("run {run_id} cannot move from {from} to {to}")]
    Run {
        run_id: Uuid,
        from: RunStatus,
        to: RunStatus,
    },

    #[error("stage '{node_id}' cannot move from {from} to {to}")]
    Stage {
        node_id: String,
        from: StageStatus,
        to: StageStatus,
    },
}

/// Publish `event` if a channel is attached. A closed receiver is ignored.
pub(crate) async fn emit(events: Option<&Sender<Event>>, event: Event) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
