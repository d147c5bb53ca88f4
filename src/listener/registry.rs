//! Listener registry
//!
//! Maps each event type to the listeners interested in it, in registration
//! order. Registration happens before dispatch starts; afterwards the
//! registry is shared read-only and only the listeners' fire times change.

use std::collections::HashMap;
use std::sync::Arc;

use super::event::EventListener;

/// Event type → listeners, in registration order
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    by_event_type: HashMap<String, Vec<Arc<EventListener>>>,
    /// Event types in the order they were first registered
    event_types: Vec<String>,
    listener_count: usize,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener under each of its event types
    ///
    /// A listener with several event types is stored once and shared, so
    /// its throttle applies across all of them.
    pub fn register(&mut self, listener: EventListener) -> Arc<EventListener> {
        let listener = Arc::new(listener);
        for event_type in listener.event_types() {
            let entry = self.by_event_type.entry(event_type.clone()).or_default();
            if entry.is_empty() {
                self.event_types.push(event_type.clone());
            }
            entry.push(Arc::clone(&listener));
        }
        self.listener_count += 1;

        tracing::debug!(event_types = ?listener.event_types(), "Registered event listener");
        listener
    }

    /// Listeners for `event_type`, `None` when nobody listens
    pub fn listeners_for(&self, event_type: &str) -> Option<&[Arc<EventListener>]> {
        self.by_event_type.get(event_type).map(Vec::as_slice)
    }

    /// Every event type with at least one listener, first-registered first
    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listener_count
    }

    pub fn is_empty(&self) -> bool {
        self.listener_count == 0
    }
}
