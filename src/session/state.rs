//! Entity state cache
//!
//! Keeps the latest known state of every entity seen in a `state_changed`
//! event, so callbacks can look at other entities without a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest known state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct StateChangedMessage {
    event: StateChangedEvent,
}

#[derive(Debug, Deserialize)]
struct StateChangedEvent {
    data: StateChangedData,
}

#[derive(Debug, Deserialize)]
struct StateChangedData {
    entity_id: String,
    #[serde(default)]
    new_state: Option<EntityState>,
}

/// Cloneable handle to the shared entity cache
#[derive(Debug, Clone, Default)]
pub struct State {
    entities: Arc<RwLock<HashMap<String, EntityState>>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known state of `entity_id`
    pub async fn get(&self, entity_id: &str) -> Option<EntityState> {
        self.entities.read().await.get(entity_id).cloned()
    }

    /// Whether `entity_id` is currently in `state`
    pub async fn equals(&self, entity_id: &str, state: &str) -> bool {
        self.entities
            .read()
            .await
            .get(entity_id)
            .map(|s| s.state == state)
            .unwrap_or(false)
    }

    /// Number of known entities
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    /// Store a state directly
    pub async fn insert(&self, state: EntityState) {
        self.entities
            .write()
            .await
            .insert(state.entity_id.clone(), state);
    }

    /// Apply a raw `state_changed` frame
    ///
    /// A `null` new state means the entity was removed. Frames that do not
    /// have the expected shape are ignored.
    pub(crate) async fn apply_state_changed(&self, raw: &[u8]) {
        let msg: StateChangedMessage = match serde_json::from_slice(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed state_changed event");
                return;
            }
        };

        let data = msg.event.data;
        let mut entities = self.entities.write().await;
        match data.new_state {
            Some(new_state) => {
                entities.insert(data.entity_id, new_state);
            }
            None => {
                entities.remove(&data.entity_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed(entity_id: &str, new_state: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": 1,
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": entity_id,
                    "old_state": null,
                    "new_state": new_state,
                },
                "origin": "LOCAL",
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_apply_new_state() {
        let state = State::new();
        let raw = state_changed(
            "light.kitchen",
            serde_json::json!({
                "entity_id": "light.kitchen",
                "state": "on",
                "attributes": {"brightness": 200},
                "last_changed": "2024-03-05T12:00:00Z",
                "last_updated": "2024-03-05T12:00:00Z",
            }),
        );

        state.apply_state_changed(&raw).await;

        let kitchen = state.get("light.kitchen").await.unwrap();
        assert_eq!(kitchen.state, "on");
        assert_eq!(kitchen.attributes["brightness"], 200);
        assert!(kitchen.last_changed.is_some());
        assert!(state.equals("light.kitchen", "on").await);
        assert!(!state.equals("light.kitchen", "off").await);
    }

    #[tokio::test]
    async fn test_removed_entity_evicted() {
        let state = State::new();
        state
            .insert(EntityState {
                entity_id: "sensor.old".to_string(),
                state: "12".to_string(),
                attributes: Default::default(),
                last_changed: None,
                last_updated: None,
            })
            .await;
        assert_eq!(state.len().await, 1);

        state
            .apply_state_changed(&state_changed("sensor.old", serde_json::Value::Null))
            .await;
        assert!(state.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_frame_ignored() {
        let state = State::new();
        state
            .apply_state_changed(br#"{"type":"event","event":{"event_type":"state_changed"}}"#)
            .await;
        assert!(state.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let state = State::new();
        let clone = state.clone();
        clone
            .apply_state_changed(&state_changed(
                "switch.fan",
                serde_json::json!({"entity_id": "switch.fan", "state": "off"}),
            ))
            .await;
        assert!(state.equals("switch.fan", "off").await);
    }
}
