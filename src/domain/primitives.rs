//! Domain primitives: TimeMs, HexColor.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Shift by a number of seconds (negative moves backwards).
    pub fn plus_secs(&self, secs: i64) -> Self {
        TimeMs(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// Whole seconds elapsed from `self` until `later`, never negative.
    pub fn secs_until(&self, later: TimeMs) -> i64 {
        later.0.saturating_sub(self.0).max(0) / 1000
    }

    /// Render as `YYYY-MM-DD HH:MM` in UTC.
    pub fn format_short(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => self.0.to_string(),
        }
    }

    /// Parse an HTML `datetime-local` value (`YYYY-MM-DDTHH:MM`, seconds
    /// optional) as UTC.
    pub fn parse_datetime_local(field: &str, raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .map(|dt| TimeMs(dt.and_utc().timestamp_millis()))
            .map_err(|_| ValidationError::new(format!("{} must be a date and time", field)))
    }
}

impl std::fmt::Display for TimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_short())
    }
}

/// Format a duration as `1h 05m`, or `12m` under an hour.
pub fn format_duration(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Normalize a `#RRGGBB` color. The leading `#` is optional on input; output
/// is always upper-case with the `#`.
pub fn normalize_hex_color(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new(format!(
            "Invalid hex color '{}', expected #RRGGBB",
            trimmed
        )));
    }
    Ok(format!("#{}", digits.to_ascii_uppercase()))
}
