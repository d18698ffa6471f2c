//! Stable event ordering for deterministic processing.

use crate::domain::LedgerEvent;

/// Chain position of an event: block number, then log index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventOrderingKey {
    pub block_number: u64,
    pub log_index: u64,
}

impl EventOrderingKey {
    pub fn from_event(event: &LedgerEvent) -> Self {
        EventOrderingKey {
            block_number: event.meta.block_number,
            log_index: event.meta.log_index,
        }
    }
}

/// Sort a batch into chain order. The sort is stable, so events sharing a
/// position (e.g. a block tick and a log at index 0) keep their delivered order.
pub fn sort_events_deterministic(events: &mut [LedgerEvent]) {
    events.sort_by_key(EventOrderingKey::from_event);
}
