//! Listener configuration errors

use thiserror::Error;

use crate::duration::DurationError;

/// Errors detected when a listener is finalized
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListenerError {
    /// No non-empty event type was given
    #[error("Listener needs at least one event type")]
    NoEventTypes,

    /// A window bound is not a valid time of day
    #[error("Invalid time of day {0:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTimeOfDay(String),

    /// The throttle is not a valid duration string
    #[error("Invalid throttle duration: {0}")]
    InvalidDuration(#[from] DurationError),

    /// An exception range ends before it starts
    #[error("Invalid exception range: {start} is after {end}")]
    InvalidRange { start: String, end: String },
}

/// Result type alias for listener construction
pub type ListenerResult<T> = Result<T, ListenerError>;
