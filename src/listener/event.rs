//! Core listener types
//!
//! - `EventListener`: an immutable listener configuration plus its last fire time
//! - `EventData`: what a callback receives
//! - `TimeWindow` and `DateRange`: the gating policies

use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::builder::EventListenerBuilder;
use crate::session::{Service, State};

/// Marker stored in `last_ran` until the first fire
///
/// Far enough in the past that no throttle can ever suppress the first fire.
const NEVER_RAN: i64 = i64::MIN;

/// Callback invoked for every event that passes a listener's conditions
pub type EventCallback = Arc<dyn Fn(Service, State, EventData) -> BoxFuture<'static, ()> + Send + Sync>;

/// The event handed to a callback
///
/// Carries only the event type and the original frame so the callback can
/// decode whatever shape it expects.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub event_type: String,
    pub raw_event_json: Bytes,
}

impl EventData {
    /// Decode the raw frame into any deserializable type
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.raw_event_json)
    }
}

/// Time-of-day window, both bounds inclusive
///
/// A missing bound leaves that side unconstrained. When `end` is earlier
/// than `start` the window wraps around midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl TimeWindow {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `time` falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        match (self.start, self.end) {
            (None, None) => true,
            (Some(start), None) => time >= start,
            (None, Some(end)) => time <= end,
            (Some(start), Some(end)) if start <= end => time >= start && time <= end,
            (Some(start), Some(end)) => time >= start || time <= end,
        }
    }
}

/// Calendar date range, both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A registered reaction to hub events
///
/// Built once through [`EventListener::builder`]; afterwards only the last
/// fire time changes.
pub struct EventListener {
    pub(super) event_types: Vec<String>,
    pub(super) callback: EventCallback,
    pub(super) window: TimeWindow,
    pub(super) throttle: Option<Duration>,
    pub(super) exception_days: Vec<NaiveDate>,
    pub(super) exception_ranges: Vec<DateRange>,
    last_ran: AtomicI64,
}

impl EventListener {
    /// Start building a listener
    pub fn builder() -> EventListenerBuilder {
        EventListenerBuilder::new()
    }

    pub(super) fn new(
        event_types: Vec<String>,
        callback: EventCallback,
        window: TimeWindow,
        throttle: Option<Duration>,
        exception_days: Vec<NaiveDate>,
        exception_ranges: Vec<DateRange>,
    ) -> Self {
        Self {
            event_types,
            callback,
            window,
            throttle,
            exception_days,
            exception_ranges,
            last_ran: AtomicI64::new(NEVER_RAN),
        }
    }

    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn throttle(&self) -> Option<Duration> {
        self.throttle
    }

    pub fn exception_days(&self) -> &[NaiveDate] {
        &self.exception_days
    }

    pub fn exception_ranges(&self) -> &[DateRange] {
        &self.exception_ranges
    }

    /// When the callback was last launched, `None` if never
    pub fn last_ran(&self) -> Option<DateTime<Utc>> {
        match self.last_ran.load(Ordering::Acquire) {
            NEVER_RAN => None,
            nanos => Some(Utc.timestamp_nanos(nanos)),
        }
    }

    /// Record a fire at `now`, at full nanosecond precision
    ///
    /// The stored time never moves backwards. Instants past the year 2262
    /// saturate to the largest representable value.
    pub(crate) fn mark_ran(&self, now: DateTime<Utc>) {
        let nanos = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.last_ran.fetch_max(nanos, Ordering::AcqRel);
    }

    /// Launch the callback as an independent task
    pub(crate) fn spawn_callback(&self, service: Service, state: State, data: EventData) {
        let fut = (self.callback)(service, state, data);
        tokio::spawn(fut);
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("event_types", &self.event_types)
            .field("window", &self.window)
            .field("throttle", &self.throttle)
            .field("exception_days", &self.exception_days)
            .field("exception_ranges", &self.exception_ranges)
            .field("last_ran", &self.last_ran())
            .finish_non_exhaustive()
    }
}
