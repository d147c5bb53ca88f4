//! # Homewire
//!
//! Real-time event core for smart-home hub websocket APIs.
//!
//! ## Features
//!
//! - **Authenticated connection**: dial, auth exchange, one shared time budget
//! - **Ordered delivery**: frames reach listeners in the order the hub sent them
//! - **Gated listeners**: time-of-day windows, throttles, exception days and ranges
//! - **Non-blocking callbacks**: every callback runs as its own task
//!
//! ## Modules
//!
//! - [`websocket`]: Handshake, serialized writer, frame reader loop
//! - [`listener`]: Listener builder, conditions, registry
//! - [`session`]: Dispatcher, service and state handles, session lifecycle
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use homewire::{Config, EventListener, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let mut session = Session::connect(&config.hub).await?;
//!
//!     let doorbell = EventListener::builder()
//!         .event_types(["doorbell_pressed"])
//!         .call(|service, _state, _event| async move {
//!             let _ = service
//!                 .call_service("light", "turn_on", Some("light.hallway"), None)
//!                 .await;
//!         })
//!         .only_between("19:00", "07:00")
//!         .throttle("30s")
//!         .build()?;
//!
//!     session.register_event_listener(doorbell);
//!
//!     // Runs until the connection ends
//!     session.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod duration;
pub mod ids;
pub mod listener;
pub mod session;
pub mod websocket;

pub use config::{generate_default_config, Config, ConfigError, HubConfig, LoggingConfig};

pub use duration::{parse_duration, DurationError, DurationString};

pub use ids::IdGenerator;

pub use listener::{
    DateRange, EventCallback, EventData, EventListener, ListenerError, ListenerRegistry,
    ListenerResult, Suppression, TimeWindow,
};

pub use session::{
    Dispatcher, EntityState, Service, Session, SessionError, SessionResult, State,
};

pub use websocket::{
    connect, run_reader_loop, subscribe_to_event_type, subscribe_to_state_changed_events,
    ConnectError, ConnectOptions, HubConnection, HubMessage, HubWriter, ReadError, WriteError,
};
