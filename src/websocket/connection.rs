//! Connection Handshake
//!
//! Dials the hub and performs the auth exchange:
//!
//! 1. open `ws://{host}:{port}/api/websocket`
//! 2. read the `auth_required` notice
//! 3. send `{"type": "auth", "access_token": ...}`
//! 4. expect `{"type": "auth_ok"}` back
//!
//! The four steps share a single time budget. Any failure drops the
//! transport and returns an error that tells an unreachable hub apart from
//! a rejected token.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::error::{ConnectError, ConnectResult, ReadError};
use super::messages::{AuthMessage, AuthResponse, AUTH_INVALID};
use super::reader::next_frame;
use super::writer::HubWriter;

/// Concrete WebSocket stream type
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Inbound half of the hub connection
pub type FrameStream = SplitStream<WsStream>;

/// Outbound half of the hub connection, before it is wrapped in a [`HubWriter`]
pub type FrameSink = SplitSink<WsStream, Message>;

/// Path of the websocket endpoint on the hub
pub const API_PATH: &str = "/api/websocket";

/// Default time budget for the whole handshake
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

/// Where and how to reach the hub
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub access_token: String,
    /// Use `wss://` instead of `ws://`
    pub secure: bool,
    /// Budget shared by all handshake steps
    pub timeout: Duration,
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, port: u16, access_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            access_token: access_token.into(),
            secure: false,
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Builder method: set the handshake budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method: connect over TLS
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Full websocket URL of the hub endpoint
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, API_PATH)
    }
}

/// An authenticated hub connection
#[derive(Debug)]
pub struct HubConnection {
    /// Serialized outbound half
    pub writer: HubWriter,
    /// Inbound half, to be handed to the reader loop
    pub reader: FrameStream,
    /// Cancelling this token stops the reader loop
    pub shutdown: CancellationToken,
}

/// Connect and authenticate against the hub
pub async fn connect(options: &ConnectOptions) -> ConnectResult<HubConnection> {
    let url = options.url();

    let result = match tokio::time::timeout(
        options.timeout,
        handshake(&url, &options.access_token),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ConnectError::Timeout(options.timeout)),
    };

    match result {
        Ok(stream) => {
            tracing::info!(url = %url, "Connected to hub");
            let (sink, reader): (FrameSink, FrameStream) = stream.split();
            Ok(HubConnection {
                writer: HubWriter::new(sink),
                reader,
                shutdown: CancellationToken::new(),
            })
        }
        Err(e) => {
            match &e {
                ConnectError::Unreachable { .. } | ConnectError::InvalidUrl { .. } => {
                    tracing::error!(
                        url = %url,
                        error = %e,
                        "Failed to connect to websocket. Check IP address and port"
                    );
                }
                ConnectError::InvalidToken { .. } => {
                    tracing::error!(
                        "Auth token is invalid. Please double check it or create a new long-lived access token"
                    );
                }
                _ => {
                    tracing::error!(url = %url, error = %e, "Error creating websocket client");
                }
            }
            Err(e)
        }
    }
}

async fn handshake(url: &str, access_token: &str) -> ConnectResult<WsStream> {
    let request = url
        .into_client_request()
        .map_err(|e| ConnectError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let (mut stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|source| ConnectError::Unreachable {
            url: url.to_string(),
            source,
        })?;

    // auth_required; the content is not inspected
    read_handshake_frame(&mut stream).await?;

    let auth = serde_json::to_string(&AuthMessage::new(access_token))?;
    stream.send(Message::Text(auth)).await?;

    let frame = read_handshake_frame(&mut stream).await?;
    let response: AuthResponse = serde_json::from_slice(&frame).unwrap_or_default();
    if !response.is_ok() {
        if response.msg_type != AUTH_INVALID {
            tracing::warn!(msg_type = %response.msg_type, "Unexpected reply to auth frame");
        }
        return Err(ConnectError::InvalidToken {
            message: response.message,
        });
    }

    Ok(stream)
}

async fn read_handshake_frame(stream: &mut WsStream) -> ConnectResult<bytes::Bytes> {
    match next_frame(stream).await {
        Some(Ok(frame)) => Ok(frame),
        Some(Err(ReadError::Transport(e))) => Err(ConnectError::Transport(e)),
        Some(Err(_)) | None => Err(ConnectError::Closed),
    }
}
