//! Event helpers for integration tests

use simplespider::Event;
use tokio::sync::broadcast::Receiver;

/// Drain every event already sent to `events`
pub fn drain_events(events: &mut Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

/// Keys of the objects stored, in storage order
pub fn stored_keys(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ObjectStored { key, .. } => Some(key.clone()),
            _ => None,
        })
        .collect()
}

/// Reasons of the aborted tasks
pub fn abort_reasons(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::TaskAborted { reason, .. } => Some(reason.clone()),
            _ => None,
        })
        .collect()
}
