//! Notification sink port: fire-and-forget outcome events.

use crate::task::domain::TaskEvent;

/// Receives outcome events for toast/notification rendering.
///
/// Publishing is fire-and-forget: implementations must not fail or block
/// the triggering engine call.
pub trait NotificationSink: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: TaskEvent);
}
