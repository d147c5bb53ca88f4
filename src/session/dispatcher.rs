//! Dispatcher
//!
//! Consumes decoded frames in arrival order, finds the listeners registered
//! for each event type, evaluates their conditions in registration order
//! and launches the callbacks of those that pass. Callbacks run as their
//! own tasks; the dispatcher never waits for them.

use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::service::Service;
use super::state::State;
use crate::listener::{evaluate, EventData, ListenerRegistry};
use crate::websocket::{BaseEventMessage, HubMessage, STATE_CHANGED};

/// Routes hub events to listeners
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ListenerRegistry>,
    service: Service,
    state: State,
}

impl Dispatcher {
    pub fn new(registry: Arc<ListenerRegistry>, service: Service, state: State) -> Self {
        Self {
            registry,
            service,
            state,
        }
    }

    /// Dispatch every message until the channel closes
    ///
    /// Returns the number of messages consumed.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<HubMessage>) -> usize {
        let mut consumed = 0;
        while let Some(msg) = rx.recv().await {
            self.dispatch(&msg).await;
            consumed += 1;
        }
        tracing::debug!(messages = consumed, "Message channel closed, dispatcher stopped");
        consumed
    }

    /// Dispatch one message using the current local time
    ///
    /// Returns the number of callbacks launched.
    pub async fn dispatch(&self, msg: &HubMessage) -> usize {
        self.dispatch_at(msg, Local::now()).await
    }

    /// Dispatch one message as if it arrived at `now`
    pub async fn dispatch_at(&self, msg: &HubMessage, now: DateTime<Local>) -> usize {
        let event_type = BaseEventMessage::event_type(&msg.raw);
        if event_type.is_empty() {
            return 0;
        }

        if event_type == STATE_CHANGED {
            self.state.apply_state_changed(&msg.raw).await;
        }

        let Some(listeners) = self.registry.listeners_for(&event_type) else {
            // no listeners registered for this event type
            return 0;
        };

        let now_utc: DateTime<Utc> = now.with_timezone(&Utc);
        let mut fired = 0;
        for listener in listeners {
            if let Err(reason) = evaluate(listener, now) {
                tracing::debug!(
                    event_type = %event_type,
                    reason = %reason,
                    "Listener suppressed"
                );
                continue;
            }

            let data = EventData {
                event_type: event_type.clone(),
                raw_event_json: msg.raw.clone(),
            };
            // Recorded before launch so a burst cannot slip past the throttle
            listener.mark_ran(now_utc);
            listener.spawn_callback(self.service.clone(), self.state.clone(), data);
            fired += 1;

            tracing::trace!(event_type = %event_type, "Listener fired");
        }

        fired
    }
}
