//! Connection Writer
//!
//! The outbound half of the hub connection. Callbacks run concurrently and
//! may all issue requests at once; the writer lets exactly one frame onto
//! the wire at a time.

use futures_util::{Sink, SinkExt};
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};

use super::error::WriteResult;
use super::messages::{SubscribeEventsRequest, STATE_CHANGED};
use crate::ids::IdGenerator;

type BoxedSink = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;

/// Serializing writer over the outbound half of the connection
pub struct HubWriter {
    sink: Mutex<BoxedSink>,
}

impl HubWriter {
    /// Wrap any websocket sink (normally the split half of the hub stream)
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink<Message, Error = tungstenite::Error> + Send + 'static,
    {
        Self {
            sink: Mutex::new(Box::pin(sink)),
        }
    }

    /// Serialize `msg` as JSON and send it as one text frame
    ///
    /// Concurrent callers queue on the write lock; frames are never
    /// interleaved.
    pub async fn write_message<T>(&self, msg: &T) -> WriteResult<()>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(msg)?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Send a close frame and flush the sink
    pub async fn close(&self) -> WriteResult<()> {
        let mut sink = self.sink.lock().await;
        sink.close().await?;
        Ok(())
    }
}

impl fmt::Debug for HubWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubWriter").finish_non_exhaustive()
    }
}

/// Subscribe to every event of `event_type`
///
/// Uses `id` when supplied, otherwise draws the next id from `ids`.
/// Returns the id the request was sent with.
pub async fn subscribe_to_event_type(
    event_type: &str,
    writer: &HubWriter,
    ids: &IdGenerator,
    id: Option<i64>,
) -> WriteResult<i64> {
    let id = match id {
        Some(id) => {
            ids.reserve(id);
            id
        }
        None => ids.next_id(),
    };

    let request = SubscribeEventsRequest::new(id, event_type);
    if let Err(e) = writer.write_message(&request).await {
        tracing::error!(event_type = %event_type, error = %e, "Failed to subscribe to events");
        return Err(e);
    }

    tracing::debug!(event_type = %event_type, id, "Subscribed to events");
    Ok(id)
}

/// Subscribe to `state_changed` events with a fixed request id
pub async fn subscribe_to_state_changed_events(
    id: i64,
    writer: &HubWriter,
    ids: &IdGenerator,
) -> WriteResult<i64> {
    subscribe_to_event_type(STATE_CHANGED, writer, ids, Some(id)).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::PollSender;

    /// A writer whose frames land in a channel instead of a socket
    pub(crate) fn channel_writer(capacity: usize) -> (HubWriter, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        let sink = PollSender::new(tx).sink_map_err(|_| tungstenite::Error::ConnectionClosed);
        (HubWriter::new(sink), rx)
    }

    /// A writer that accepts and discards every frame
    pub(crate) fn discard_writer() -> HubWriter {
        HubWriter::new(
            futures_util::sink::drain()
                .sink_map_err(|never: std::convert::Infallible| -> tungstenite::Error { match never {} }),
        )
    }

    pub(crate) fn frame_json(frame: Message) -> serde_json::Value {
        match frame {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("Expected text frame, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_write_message_sends_json_text() {
        let (writer, mut rx) = channel_writer(4);
        writer
            .write_message(&serde_json::json!({"id": 1, "type": "ping"}))
            .await
            .unwrap();

        let json = frame_json(rx.recv().await.unwrap());
        assert_eq!(json["type"], "ping");
    }

    #[tokio::test]
    async fn test_write_to_closed_connection_fails() {
        let (writer, rx) = channel_writer(1);
        drop(rx);

        let result = writer.write_message(&serde_json::json!({"id": 1})).await;
        assert!(matches!(result, Err(super::super::WriteError::Closed)));
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_not_interleaved() {
        let (writer, mut rx) = channel_writer(64);
        let writer = Arc::new(writer);

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let writer = Arc::clone(&writer);
                tokio::spawn(async move {
                    writer
                        .write_message(&serde_json::json!({"id": i, "type": "call_service"}))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut ids = Vec::new();
        for _ in 0..20 {
            let json = frame_json(rx.recv().await.unwrap());
            ids.push(json["id"].as_i64().unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_subscribe_uses_generated_id() {
        let (writer, mut rx) = channel_writer(4);
        let ids = IdGenerator::new();

        let id = subscribe_to_event_type("call_service", &writer, &ids, None)
            .await
            .unwrap();
        assert_eq!(id, 1);

        let json = frame_json(rx.recv().await.unwrap());
        assert_eq!(json["id"], 1);
        assert_eq!(json["type"], "subscribe_events");
        assert_eq!(json["event_type"], "call_service");
    }

    #[tokio::test]
    async fn test_subscribe_with_supplied_id_reserves_it() {
        let (writer, mut rx) = channel_writer(4);
        let ids = IdGenerator::new();

        let id = subscribe_to_state_changed_events(42, &writer, &ids)
            .await
            .unwrap();
        assert_eq!(id, 42);
        assert_eq!(ids.next_id(), 43);

        let json = frame_json(rx.recv().await.unwrap());
        assert_eq!(json["event_type"], "state_changed");
        assert_eq!(json["id"], 42);
    }

    #[tokio::test]
    async fn test_subscribe_write_failure_is_reported() {
        let (writer, rx) = channel_writer(1);
        drop(rx);
        let ids = IdGenerator::new();

        let result = subscribe_to_event_type("state_changed", &writer, &ids, None).await;
        assert!(result.is_err());
    }
}
