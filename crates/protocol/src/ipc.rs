//! Engine lifecycle events.
//!
//! The engine can publish these over a channel while it works. They mirror
//! the persisted run and stage records and are advisory: a closed receiver
//! never affects execution.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "stageStatusUpdate",
//!   "payload": {
//!     "run_id": "uuid-here",
//!     "node_id": "health",
//!     "status": "running"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::run_models::{FailureKind, RunStatus, StageStatus};

/// Events sent from the engine to observers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A run attempt has begun.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        pipeline_name: String,
        attempt: u32,
    },

    /// A run's status has changed.
    RunStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        status: RunStatus,
        attempt: u32,
    },

    /// A stage's status has changed.
    StageStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        node_id: String,
        status: StageStatus,
    },

    /// A run attempt finished successfully.
    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// A run attempt was aborted by a required node failure.
    RunFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        kind: FailureKind,
        error: String,
    },
}
