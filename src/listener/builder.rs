//! Staged listener builder
//!
//! ```text
//! EventListener::builder()      -> EventListenerBuilder
//!     .event_types([...])       -> EventTypesStage
//!     .call(callback)           -> CallbackStage
//!     .only_between("22:00", "06:00")
//!     .throttle("30s")
//!     .exception_day(date)
//!     .build()                  -> ListenerResult<EventListener>
//! ```
//!
//! Each stage is its own type, so a listener without event types or
//! without a callback does not compile. The refinements on
//! [`CallbackStage`] can be chained in any order and combination.

use chrono::{Duration, NaiveDate, NaiveTime};
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;

use super::error::{ListenerError, ListenerResult};
use super::event::{DateRange, EventCallback, EventData, EventListener, TimeWindow};
use crate::duration::DurationString;
use crate::session::{Service, State};

/// First stage: nothing chosen yet
#[derive(Debug, Default)]
pub struct EventListenerBuilder {
    _private: (),
}

impl EventListenerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event types this listener reacts to
    ///
    /// Duplicates and empty strings are dropped; order is kept.
    pub fn event_types<I, S>(self, event_types: I) -> EventTypesStage
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut types: Vec<String> = Vec::new();
        for event_type in event_types {
            let event_type = event_type.into();
            if !event_type.is_empty() && !types.contains(&event_type) {
                types.push(event_type);
            }
        }
        EventTypesStage { event_types: types }
    }
}

/// Second stage: event types chosen, callback missing
#[derive(Debug)]
pub struct EventTypesStage {
    event_types: Vec<String>,
}

impl EventTypesStage {
    /// Function to run for every event that passes the listener's conditions
    pub fn call<F, Fut>(self, callback: F) -> CallbackStage
    where
        F: Fn(Service, State, EventData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: EventCallback =
            Arc::new(move |service: Service, state: State, data: EventData| {
                callback(service, state, data).boxed()
            });
        CallbackStage {
            event_types: self.event_types,
            callback,
            window_start: None,
            window_end: None,
            throttle: None,
            exception_days: Vec::new(),
            exception_ranges: Vec::new(),
        }
    }
}

/// Final stage: optional refinements, then [`CallbackStage::build`]
pub struct CallbackStage {
    event_types: Vec<String>,
    callback: EventCallback,
    window_start: Option<String>,
    window_end: Option<String>,
    throttle: Option<DurationString>,
    exception_days: Vec<NaiveDate>,
    exception_ranges: Vec<(NaiveDate, NaiveDate)>,
}

impl CallbackStage {
    /// Only fire between `start` and `end` (`HH:MM`, inclusive)
    ///
    /// `end` earlier than `start` means the window spans midnight.
    pub fn only_between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.window_start = Some(start.into());
        self.window_end = Some(end.into());
        self
    }

    /// Only fire at or after `start`
    pub fn only_after(mut self, start: impl Into<String>) -> Self {
        self.window_start = Some(start.into());
        self
    }

    /// Only fire at or before `end`
    pub fn only_before(mut self, end: impl Into<String>) -> Self {
        self.window_end = Some(end.into());
        self
    }

    /// Minimum time between two fires, e.g. `"30s"` or `"1h"`
    pub fn throttle(mut self, duration: impl Into<DurationString>) -> Self {
        self.throttle = Some(duration.into());
        self
    }

    /// Never fire on this date
    pub fn exception_day(mut self, date: NaiveDate) -> Self {
        self.exception_days.push(date);
        self
    }

    /// Never fire from `start` through `end`
    pub fn exception_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.exception_ranges.push((start, end));
        self
    }

    /// Validate the refinements and produce the listener
    pub fn build(self) -> ListenerResult<EventListener> {
        if self.event_types.is_empty() {
            return Err(ListenerError::NoEventTypes);
        }

        let window = TimeWindow {
            start: self.window_start.as_deref().map(parse_time_of_day).transpose()?,
            end: self.window_end.as_deref().map(parse_time_of_day).transpose()?,
        };

        let throttle = match self.throttle {
            Some(s) => {
                let std_duration = s.parse()?;
                let duration = Duration::from_std(std_duration).map_err(|_| {
                    ListenerError::InvalidDuration(crate::duration::DurationError::OutOfRange(
                        s.to_string(),
                    ))
                })?;
                Some(duration)
            }
            None => None,
        };

        let exception_ranges = self
            .exception_ranges
            .into_iter()
            .map(|(start, end)| {
                if end < start {
                    Err(ListenerError::InvalidRange {
                        start: start.to_string(),
                        end: end.to_string(),
                    })
                } else {
                    Ok(DateRange { start, end })
                }
            })
            .collect::<ListenerResult<Vec<_>>>()?;

        Ok(EventListener::new(
            self.event_types,
            self.callback,
            window,
            throttle,
            self.exception_days,
            exception_ranges,
        ))
    }
}

fn parse_time_of_day(s: &str) -> ListenerResult<NaiveTime> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ListenerError::InvalidTimeOfDay(s.to_string()))
}
