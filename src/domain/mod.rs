//! Domain types for the cross-stitch tracker.
//!
//! This module provides:
//! - Primitives: `TimeMs`, hex color normalization, duration formatting
//! - Records for users, floss colors and inventory, patterns, projects,
//!   work sessions and shopping list items
//! - Field validation shared by the web forms and the seed tooling

pub mod floss;
pub mod pattern;
pub mod primitives;
pub mod project;
pub mod shopping;
pub mod user;

pub use floss::{FlossColor, InventoryItem, NewFlossColor};
pub use pattern::{Pattern, PatternFloss, PatternInput, Shortage};
pub use primitives::{format_duration, normalize_hex_color, TimeMs};
pub use project::{Project, ProjectInput, ProjectStatus, ProjectTotals, WorkSession};
pub use shopping::ShoppingListItem;
pub use user::{NewUser, User};

use thiserror::Error;

/// Largest skein count accepted from a single form.
pub const MAX_SKEINS: i64 = 9_999;
/// Largest pattern width or height, in stitches.
pub const MAX_PATTERN_SIDE: i64 = 10_000;
/// Longest manually logged session.
pub const MAX_SESSION_MINUTES: i64 = 24 * 60;
/// Most stitches recorded for one session.
pub const MAX_SESSION_STITCHES: i64 = 1_000_000;

/// A user-supplied value failed validation. The message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        ValidationError(msg.into())
    }
}

/// Trim a required text field and check its length in characters.
pub fn required_text(field: &str, raw: &str, max_len: usize) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::new(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Trim an optional text field; blank input becomes `None`.
pub fn optional_text(
    field: &str,
    raw: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) if value.chars().count() > max_len => Err(ValidationError::new(format!(
            "{} must be at most {} characters",
            field, max_len
        ))),
        Some(value) => Ok(Some(value.to_string())),
    }
}

/// Parse an optional integer form field; blank input becomes `None`.
pub fn optional_int(field: &str, raw: Option<&str>) -> Result<Option<i64>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::new(format!("{} must be a whole number", field))),
    }
}

/// Parse an integer form field within `min..=max`.
pub fn int_in_range(field: &str, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(format!("{} must be a whole number", field)))?;
    if value < min {
        return Err(ValidationError::new(format!(
            "{} must be at least {}",
            field, min
        )));
    }
    if value > max {
        return Err(ValidationError::new(format!(
            "{} must be at most {}",
            field, max
        )));
    }
    Ok(value)
}
