//! WebSocket Message Types
//!
//! Defines the envelopes exchanged with the hub: the auth exchange,
//! outbound requests, and the normalized form of every inbound frame.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Message type of the auth frame sent by the client
pub const AUTH: &str = "auth";
/// Message type the hub answers with when the token is accepted
pub const AUTH_OK: &str = "auth_ok";
/// Message type the hub answers with when the token is rejected
pub const AUTH_INVALID: &str = "auth_invalid";
/// Message type of an event subscription request
pub const SUBSCRIBE_EVENTS: &str = "subscribe_events";
/// Message type of a remote action request
pub const CALL_SERVICE: &str = "call_service";
/// Event type the hub emits whenever an entity changes state
pub const STATE_CHANGED: &str = "state_changed";

/// Authentication frame sent right after the hub's `auth_required` notice
#[derive(Debug, Clone, Serialize)]
pub struct AuthMessage<'a> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub access_token: &'a str,
}

impl<'a> AuthMessage<'a> {
    pub fn new(access_token: &'a str) -> Self {
        Self {
            msg_type: AUTH,
            access_token,
        }
    }
}

/// Hub reply to the auth frame
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// Whether the hub accepted the token
    pub fn is_ok(&self) -> bool {
        self.msg_type == AUTH_OK
    }
}

/// Request to receive every event of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeEventsRequest {
    pub id: i64,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub event_type: String,
}

impl SubscribeEventsRequest {
    pub fn new(id: i64, event_type: impl Into<String>) -> Self {
        Self {
            id,
            msg_type: SUBSCRIBE_EVENTS.to_string(),
            event_type: event_type.into(),
        }
    }
}

/// Request to invoke an action (`domain.service`) on the hub
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallServiceRequest {
    pub id: i64,
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub domain: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_data: Option<serde_json::Value>,
    pub target: ServiceTarget,
}

/// Entity targeted by a [`CallServiceRequest`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// A decoded inbound frame
///
/// Produced once per frame by the reader loop and consumed once by the
/// dispatcher. `raw` keeps the original payload so listeners can decode
/// whatever shape they expect.
#[derive(Debug, Clone, PartialEq)]
pub struct HubMessage {
    /// Correlation id (0 when the frame carries none)
    pub id: i64,
    /// Envelope type (`event`, `result`, ...)
    pub msg_type: String,
    /// `false` only when the hub explicitly reported failure
    pub success: bool,
    /// The frame exactly as received
    pub raw: Bytes,
}

impl HubMessage {
    /// Decode the envelope fields of a frame
    ///
    /// Each field is extracted independently, so a frame with one
    /// malformed field still yields the others. Frames that are not JSON
    /// objects produce an empty type.
    pub fn decode(raw: Bytes) -> Self {
        let value: serde_json::Value =
            serde_json::from_slice(&raw).unwrap_or(serde_json::Value::Null);

        let msg_type = value
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let id = value.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
        // Event frames usually omit "success"; absence is not failure
        let success = value
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        Self {
            id,
            msg_type,
            success,
            raw,
        }
    }
}

/// Minimal shape of an event frame, enough to route it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseEventMessage {
    #[serde(default)]
    pub event: BaseEvent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseEvent {
    #[serde(default)]
    pub event_type: String,
}

impl BaseEventMessage {
    /// Extract the event type of a frame, empty when there is none
    pub fn event_type(raw: &[u8]) -> String {
        serde_json::from_slice::<BaseEventMessage>(raw)
            .map(|msg| msg.event.event_type)
            .unwrap_or_default()
    }
}
