//! Custom assertion helpers.

use ol_protocol::{Event, RunStatus, StageExecution, StageStatus};
use tokio::sync::mpsc;

/// Drain every event currently buffered on `rx`.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert the stages' node ids and statuses, in order.
#[allow(dead_code)]
pub fn assert_stages(stages: &[StageExecution], expected: &[(&str, StageStatus)]) {
    let actual: Vec<(&str, StageStatus)> = stages
        .iter()
        .map(|s| (s.node_id.as_str(), s.status))
        .collect();
    assert_eq!(actual, expected, "stage sequence mismatch");
}

/// Whether `events` contains a run status update to `status`.
#[allow(dead_code)]
pub fn has_run_status(events: &[Event], status: RunStatus) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::RunStatusUpdate { status: s, .. } if *s == status))
}

/// Assert that events start with RunStarted and end with a terminal event.
#[allow(dead_code)]
pub fn assert_event_sequence(events: &[Event]) {
    assert!(!events.is_empty(), "Event sequence is empty");

    assert!(
        matches!(events[0], Event::RunStarted { .. }),
        "First event should be RunStarted, got: {:?}",
        events[0]
    );

    let last = &events[events.len() - 1];
    assert!(
        matches!(last, Event::RunCompleted { .. } | Event::RunFailed { .. }),
        "Last event should be RunCompleted or RunFailed, got: {:?}",
        last
    );
}
