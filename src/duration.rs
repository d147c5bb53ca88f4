//! Duration strings
//!
//! Human-readable durations such as `"10s"`, `"1h30m"` or `"1.5h"`: a
//! sequence of decimal numbers, each followed by a unit (`ns`, `us`/`µs`,
//! `ms`, `s`, `m`, `h`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing a duration string
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DurationError {
    #[error("Empty duration string")]
    Empty,

    #[error("Invalid duration {0:?}")]
    Invalid(String),

    #[error("Duration {0:?} is out of range")]
    OutOfRange(String),
}

/// An unparsed duration such as `"30s"` or `"1h15m"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationString(String);

impl DurationString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a machine duration
    pub fn parse(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.0)
    }
}

impl From<&str> for DurationString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DurationString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DurationString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a duration string
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let whole = Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .map_err(|_| DurationError::Invalid(s.to_string()))?;
    if !whole.is_match(s) {
        return Err(DurationError::Invalid(s.to_string()));
    }

    let part = Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)")
        .map_err(|_| DurationError::Invalid(s.to_string()))?;

    let mut total_secs = 0.0_f64;
    for caps in part.captures_iter(s) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| DurationError::Invalid(s.to_string()))?;
        let unit_secs = match &caps[2] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(DurationError::Invalid(s.to_string())),
        };
        total_secs += value * unit_secs;
    }

    Duration::try_from_secs_f64(total_secs).map_err(|_| DurationError::OutOfRange(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_strings() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("10"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("ten seconds"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-5s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("5d"), Err(DurationError::Invalid(_))));
    }

    #[test]
    fn test_duration_string_wrapper() {
        let d: DurationString = "45s".into();
        assert_eq!(d.as_str(), "45s");
        assert_eq!(d.to_string(), "45s");
        assert_eq!(d.parse().unwrap(), Duration::from_secs(45));
    }
}
