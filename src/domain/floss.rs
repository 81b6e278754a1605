//! Floss colors (reference data) and a user's floss stash.

use serde::{Deserialize, Serialize};

use super::{normalize_hex_color, optional_text, required_text, TimeMs, ValidationError};

pub const DMC_BRAND: &str = "DMC";

/// A row of the floss color reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlossColor {
    pub id: i64,
    /// e.g. "DMC", "Anchor".
    pub brand: String,
    /// e.g. "310", "B5200".
    pub color_number: String,
    pub color_name: Option<String>,
    /// `#RRGGBB`.
    pub hex_color: Option<String>,
}

impl FlossColor {
    /// "DMC 310 Black".
    pub fn label(&self) -> String {
        match &self.color_name {
            Some(name) => format!("{} {} {}", self.brand, self.color_number, name),
            None => format!("{} {}", self.brand, self.color_number),
        }
    }
}

/// A floss color about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFlossColor {
    pub brand: String,
    pub color_number: String,
    pub color_name: Option<String>,
    pub hex_color: Option<String>,
}

impl NewFlossColor {
    /// Trim, bound-check and normalize every field.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let hex_color = match self.hex_color.as_deref().map(str::trim) {
            Some(hex) if !hex.is_empty() => Some(normalize_hex_color(hex)?),
            _ => None,
        };
        Ok(NewFlossColor {
            brand: required_text("Brand", &self.brand, 50)?,
            color_number: required_text("Color number", &self.color_number, 20)?,
            color_name: optional_text("Color name", self.color_name.as_deref(), 100)?,
            hex_color,
        })
    }
}

/// One color in a user's stash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: i64,
    pub user_id: i64,
    pub color: FlossColor,
    /// Skeins on hand.
    pub quantity: i64,
    /// Free-form storage location, e.g. "Box A, bobbin 12".
    pub location: Option<String>,
    pub updated_at: TimeMs,
}
