//! Hub WebSocket Transport
//!
//! Everything that touches the wire: the authenticated handshake, the
//! serialized outbound writer, and the inbound frame reader loop.
//!
//! ## Architecture
//!
//! - **Connection**: dials the hub and performs the auth exchange
//! - **Writer**: one write lock in front of the outbound half
//! - **Reader**: decodes every inbound frame and forwards it in order
//! - **Messages**: wire envelopes for both directions
//!
//! ## Protocol
//!
//! ```text
//! hub    -> {"type": "auth_required"}
//! client -> {"type": "auth", "access_token": "..."}
//! hub    -> {"type": "auth_ok"}            (or "auth_invalid")
//! client -> {"id": 1, "type": "subscribe_events", "event_type": "state_changed"}
//! hub    -> {"id": 1, "type": "result", "success": true}
//! hub    -> {"id": 1, "type": "event", "event": {"event_type": "state_changed", ...}}
//! ```

mod connection;
mod error;
mod messages;
mod reader;
mod writer;

#[cfg(test)]
pub(crate) use writer::test_support;

pub use connection::{
    connect, ConnectOptions, FrameSink, FrameStream, HubConnection, WsStream, API_PATH,
    DEFAULT_HANDSHAKE_TIMEOUT,
};
pub use error::{ConnectError, ConnectResult, ReadError, WriteError, WriteResult};
pub use messages::{
    AuthMessage, AuthResponse, BaseEvent, BaseEventMessage, CallServiceRequest, HubMessage,
    ServiceTarget, SubscribeEventsRequest, AUTH, AUTH_INVALID, AUTH_OK, CALL_SERVICE,
    STATE_CHANGED, SUBSCRIBE_EVENTS,
};
pub use reader::run_reader_loop;
pub use writer::{subscribe_to_event_type, subscribe_to_state_changed_events, HubWriter};
