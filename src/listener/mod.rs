//! Event Listeners
//!
//! User-registered reactions to hub events, each gated by independent
//! temporal policies.
//!
//! ## Architecture
//!
//! - **Builder**: staged construction, event types and callback first
//! - **Conditions**: time window, throttle, exception days and ranges
//! - **Registry**: event type → listeners, in registration order
//!
//! ## Example
//!
//! ```rust,no_run
//! use homewire::listener::EventListener;
//!
//! let listener = EventListener::builder()
//!     .event_types(["zwave_js_value_notification"])
//!     .call(|service, _state, event| async move {
//!         tracing::info!(event_type = %event.event_type, "Button pressed");
//!         let _ = service
//!             .call_service("light", "toggle", Some("light.porch"), None)
//!             .await;
//!     })
//!     .only_between("18:00", "06:00")
//!     .throttle("2s")
//!     .build()
//!     .expect("valid listener");
//! ```

mod builder;
mod conditions;
mod error;
mod event;
mod registry;

pub use builder::{CallbackStage, EventListenerBuilder, EventTypesStage};
pub use conditions::{
    check_exception_days, check_exception_ranges, check_throttle, check_within_time_window,
    evaluate, Suppression,
};
pub use error::{ListenerError, ListenerResult};
pub use event::{DateRange, EventCallback, EventData, EventListener, TimeWindow};
pub use registry::ListenerRegistry;
