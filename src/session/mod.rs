//! Hub Session
//!
//! Ties the transport and the listeners together for the lifetime of one
//! connection:
//!
//! ```text
//! connect -> register listeners -> run
//!                                   |- subscribe to every event type (+ state_changed)
//!                                   |- reader task: frames -> channel
//!                                   '- dispatcher: channel -> listeners -> callbacks
//! ```
//!
//! `run` consumes the session, so no listener can be added once dispatch
//! has started. There is no reconnection; when `run` returns the caller
//! decides what to do next.

mod dispatcher;
mod error;
mod service;
mod state;

pub use dispatcher::Dispatcher;
pub use error::{SessionError, SessionResult};
pub use service::Service;
pub use state::{EntityState, State};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::ids::IdGenerator;
use crate::listener::{EventListener, ListenerRegistry};
use crate::websocket::{
    self, run_reader_loop, subscribe_to_event_type, subscribe_to_state_changed_events, FrameStream,
    HubConnection, STATE_CHANGED,
};

/// One authenticated connection plus its listeners
#[derive(Debug)]
pub struct Session {
    writer: Arc<websocket::HubWriter>,
    reader: FrameStream,
    shutdown: CancellationToken,
    ids: Arc<IdGenerator>,
    registry: ListenerRegistry,
    state: State,
}

impl Session {
    /// Connect and authenticate using `config`
    pub async fn connect(config: &HubConfig) -> SessionResult<Self> {
        let connection = websocket::connect(&config.connect_options()).await?;
        Ok(Self::from_connection(connection))
    }

    /// Wrap an already authenticated connection
    pub fn from_connection(connection: HubConnection) -> Self {
        Self {
            writer: Arc::new(connection.writer),
            reader: connection.reader,
            shutdown: connection.shutdown,
            ids: Arc::new(IdGenerator::new()),
            registry: ListenerRegistry::new(),
            state: State::new(),
        }
    }

    /// Register one listener
    pub fn register_event_listener(&mut self, listener: EventListener) -> &mut Self {
        self.registry.register(listener);
        self
    }

    /// Register several listeners, keeping their order
    pub fn register_event_listeners<I>(&mut self, listeners: I) -> &mut Self
    where
        I: IntoIterator<Item = EventListener>,
    {
        for listener in listeners {
            self.registry.register(listener);
        }
        self
    }

    /// Handle for sending requests on this connection
    pub fn service(&self) -> Service {
        Service::new(Arc::clone(&self.writer), Arc::clone(&self.ids))
    }

    /// Handle to the entity state cache
    pub fn state(&self) -> State {
        self.state.clone()
    }

    /// Cancel this token to stop the session gracefully
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Subscribe, then read and dispatch until the connection ends
    ///
    /// Every registered event type is subscribed in registration order.
    /// `state_changed` is always subscribed as well, so the [`State`] cache
    /// stays current even when no listener asks for it.
    ///
    /// Returns `Ok(())` after a graceful shutdown and the terminal error
    /// otherwise. A failed subscription ends the session before any frame
    /// is read.
    pub async fn run(self) -> SessionResult<()> {
        let service = self.service();
        let Session {
            writer,
            reader,
            shutdown,
            ids,
            registry,
            state,
        } = self;

        for event_type in registry.event_types() {
            subscribe_to_event_type(event_type, &writer, &ids, None).await?;
        }
        if registry.listeners_for(STATE_CHANGED).is_none() {
            // feeds the state cache only
            subscribe_to_state_changed_events(ids.next_id(), &writer, &ids).await?;
        }
        tracing::info!(
            listeners = registry.len(),
            event_types = registry.event_types().len(),
            "Session started"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(run_reader_loop(reader, shutdown.clone(), tx));

        let dispatcher = Dispatcher::new(Arc::new(registry), service, state);
        let consumed = dispatcher.run(rx).await;

        let result = reader_task.await?;
        if let Err(e) = writer.close().await {
            tracing::debug!(error = %e, "Error closing websocket");
        }

        match result {
            Ok(()) => {
                tracing::info!(messages = consumed, "Session shut down");
                Ok(())
            }
            Err(e) => {
                tracing::error!(messages = consumed, error = %e, "Session ended");
                Err(SessionError::Read(e))
            }
        }
    }
}
