//! Frame Reader Loop
//!
//! Reads frames off the inbound half of the connection, decodes their
//! envelope and forwards them, in arrival order, to the dispatcher.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::error::ReadError;
use super::messages::HubMessage;

/// Read the next data frame, skipping control frames
///
/// Returns `None` once the stream has ended without a close frame.
pub(crate) async fn next_frame<S>(stream: &mut S) -> Option<Result<Bytes, ReadError>>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await? {
            Ok(Message::Text(text)) => return Some(Ok(Bytes::from(text))),
            Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|cf| (u16::from(cf.code), cf.reason.to_string()))
                    .unwrap_or((1005, String::new()));
                return Some(Err(ReadError::Closed { code, reason }));
            }
            Err(e) => return Some(Err(ReadError::Transport(e))),
        }
    }
}

/// Run the reader until the transport fails or `shutdown` is cancelled
///
/// Every frame becomes one [`HubMessage`] on `tx`. The sender is dropped
/// when the loop returns, which closes the channel and ends dispatch.
/// Returns `Ok(())` on shutdown or when the receiving side has gone away,
/// and the terminal read error otherwise. Nothing is retried.
pub async fn run_reader_loop<S>(
    mut stream: S,
    shutdown: CancellationToken,
    tx: mpsc::UnboundedSender<HubMessage>,
) -> Result<(), ReadError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Reader loop shut down");
                return Ok(());
            }
            frame = next_frame(&mut stream) => frame,
        };

        let raw = match frame {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                tracing::error!(error = %e, "Error reading from websocket");
                return Err(e);
            }
            None => {
                tracing::error!("WebSocket stream ended");
                return Err(ReadError::EndOfStream);
            }
        };

        let msg = HubMessage::decode(raw);
        if !msg.success {
            tracing::warn!(
                id = msg.id,
                response = %String::from_utf8_lossy(&msg.raw),
                "Received unsuccessful response"
            );
        }

        if tx.send(msg).is_err() {
            tracing::debug!("Message receiver dropped, stopping reader loop");
            return Ok(());
        }
    }
}
