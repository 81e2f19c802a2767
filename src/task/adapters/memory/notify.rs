//! In-memory notification sink collecting published events.

use std::sync::{Arc, RwLock};

use crate::task::{domain::TaskEvent, ports::NotificationSink};

/// Thread-safe notification sink that records every published event.
///
/// Publishing never fails; if the collection lock is poisoned the event is
/// dropped, honouring the fire-and-forget contract.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    events: Arc<RwLock<Vec<TaskEvent>>>,
}

impl InMemoryNotificationSink {
    /// Creates an empty in-memory notification sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published events in publish order.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .read()
            .map_or_else(|_| Vec::new(), |events| events.clone())
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn publish(&self, event: TaskEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}
