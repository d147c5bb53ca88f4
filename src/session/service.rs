//! Service handle
//!
//! What a callback uses to talk back to the hub. Cloning is cheap; every
//! clone shares the session's writer and id sequence.

use serde::Serialize;
use std::sync::Arc;

use crate::ids::IdGenerator;
use crate::websocket::{
    subscribe_to_event_type, CallServiceRequest, HubWriter, ServiceTarget, WriteResult,
    CALL_SERVICE,
};

/// Cloneable handle for sending requests over the session's connection
#[derive(Debug, Clone)]
pub struct Service {
    writer: Arc<HubWriter>,
    ids: Arc<IdGenerator>,
}

impl Service {
    pub fn new(writer: Arc<HubWriter>, ids: Arc<IdGenerator>) -> Self {
        Self { writer, ids }
    }

    /// Take the next request id of the session
    pub fn next_id(&self) -> i64 {
        self.ids.next_id()
    }

    /// Send any JSON-serializable message as one frame
    pub async fn send<T>(&self, msg: &T) -> WriteResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.writer.write_message(msg).await
    }

    /// Invoke `domain.service`, optionally on one entity
    ///
    /// Returns the request id so the caller can match the hub's result.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        service_data: Option<serde_json::Value>,
    ) -> WriteResult<i64> {
        let request = CallServiceRequest {
            id: self.next_id(),
            msg_type: CALL_SERVICE,
            domain: domain.to_string(),
            service: service.to_string(),
            service_data,
            target: ServiceTarget {
                entity_id: entity_id.map(str::to_string),
            },
        };

        if let Err(e) = self.send(&request).await {
            tracing::warn!(
                domain = %domain,
                service = %service,
                error = %e,
                "Failed to call service"
            );
            return Err(e);
        }
        Ok(request.id)
    }

    /// Subscribe to another event type on the live connection
    pub async fn subscribe_events(&self, event_type: &str) -> WriteResult<i64> {
        subscribe_to_event_type(event_type, &self.writer, &self.ids, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::test_support::{channel_writer, frame_json};

    #[tokio::test]
    async fn test_call_service_envelope() {
        let (writer, mut rx) = channel_writer(4);
        let service = Service::new(Arc::new(writer), Arc::new(IdGenerator::new()));

        let id = service
            .call_service(
                "light",
                "turn_on",
                Some("light.kitchen"),
                Some(serde_json::json!({"brightness_pct": 40})),
            )
            .await
            .unwrap();
        assert_eq!(id, 1);

        let json = frame_json(rx.recv().await.unwrap());
        assert_eq!(json["id"], 1);
        assert_eq!(json["type"], "call_service");
        assert_eq!(json["domain"], "light");
        assert_eq!(json["service"], "turn_on");
        assert_eq!(json["service_data"]["brightness_pct"], 40);
        assert_eq!(json["target"]["entity_id"], "light.kitchen");
    }

    #[tokio::test]
    async fn test_requests_share_one_id_sequence() {
        let (writer, mut rx) = channel_writer(8);
        let ids = Arc::new(IdGenerator::new());
        let service = Service::new(Arc::new(writer), Arc::clone(&ids));
        let clone = service.clone();

        service.subscribe_events("state_changed").await.unwrap();
        clone
            .call_service("homeassistant", "restart", None, None)
            .await
            .unwrap();
        assert_eq!(ids.next_id(), 3);

        let first = frame_json(rx.recv().await.unwrap());
        let second = frame_json(rx.recv().await.unwrap());
        assert_eq!(first["id"], 1);
        assert_eq!(first["type"], "subscribe_events");
        assert_eq!(second["id"], 2);
        assert!(second.get("service_data").is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_local() {
        let (writer, rx) = channel_writer(1);
        drop(rx);
        let service = Service::new(Arc::new(writer), Arc::new(IdGenerator::new()));

        assert!(service.call_service("switch", "toggle", None, None).await.is_err());
        // The handle stays usable for the next attempt
        assert_eq!(service.next_id(), 2);
    }
}
