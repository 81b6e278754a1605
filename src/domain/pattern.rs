//! Patterns and their floss requirements.

use std::collections::HashMap;

use super::{
    optional_int, optional_text, required_text, FlossColor, TimeMs, ValidationError,
    MAX_PATTERN_SIDE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub designer: Option<String>,
    /// Width in stitches.
    pub width: Option<i64>,
    /// Height in stitches.
    pub height: Option<i64>,
    /// e.g. "14 count Aida, antique white".
    pub fabric: Option<String>,
    pub notes: Option<String>,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

impl Pattern {
    /// Total stitch area when both dimensions are known.
    pub fn stitch_count(&self) -> Option<i64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => w.checked_mul(h),
            _ => None,
        }
    }
}

/// Validated create/update fields for a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternInput {
    pub name: String,
    pub designer: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fabric: Option<String>,
    pub notes: Option<String>,
}

impl PatternInput {
    pub fn parse(
        name: &str,
        designer: Option<&str>,
        width: Option<&str>,
        height: Option<&str>,
        fabric: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let width = optional_int("Width", width)?;
        let height = optional_int("Height", height)?;
        for (field, value) in [("Width", width), ("Height", height)] {
            if matches!(value, Some(v) if v <= 0) {
                return Err(ValidationError::new(format!("{} must be positive", field)));
            }
            if matches!(value, Some(v) if v > MAX_PATTERN_SIDE) {
                return Err(ValidationError::new(format!(
                    "{} must be at most {} stitches",
                    field, MAX_PATTERN_SIDE
                )));
            }
        }

        Ok(PatternInput {
            name: required_text("Name", name, 200)?,
            designer: optional_text("Designer", designer, 100)?,
            width,
            height,
            fabric: optional_text("Fabric", fabric, 100)?,
            notes: optional_text("Notes", notes, 2000)?,
        })
    }
}

/// A floss color a pattern calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFloss {
    pub id: i64,
    pub pattern_id: i64,
    pub color: FlossColor,
    pub skeins_required: i64,
}

/// Skeins a pattern needs beyond what the stash holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortage {
    pub color: FlossColor,
    pub required: i64,
    pub owned: i64,
    pub missing: i64,
}

/// Compare requirements with owned quantities keyed by floss color id.
/// Only colors with something missing are returned, in requirement order.
pub fn compute_shortages(requirements: &[PatternFloss], owned: &HashMap<i64, i64>) -> Vec<Shortage> {
    requirements
        .iter()
        .filter_map(|req| {
            let have = owned.get(&req.color.id).copied().unwrap_or(0).max(0);
            let missing = req.skeins_required.saturating_sub(have);
            (missing > 0).then(|| Shortage {
                color: req.color.clone(),
                required: req.skeins_required,
                owned: have,
                missing,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(id: i64, number: &str) -> FlossColor {
        FlossColor {
            id,
            brand: "DMC".to_string(),
            color_number: number.to_string(),
            color_name: None,
            hex_color: None,
        }
    }

    fn req(id: i64, color_id: i64, skeins: i64) -> PatternFloss {
        PatternFloss {
            id,
            pattern_id: 1,
            color: color(color_id, &color_id.to_string()),
            skeins_required: skeins,
        }
    }

    #[test]
    fn test_compute_shortages() {
        let requirements = vec![req(1, 10, 2), req(2, 11, 1), req(3, 12, 3)];
        let owned = HashMap::from([(10, 1), (11, 5)]);

        let shortages = compute_shortages(&requirements, &owned);
        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].color.id, 10);
        assert_eq!(shortages[0].missing, 1);
        assert_eq!(shortages[1].color.id, 12);
        assert_eq!(shortages[1].owned, 0);
        assert_eq!(shortages[1].missing, 3);
    }

    #[test]
    fn test_pattern_input_rejects_non_positive_size() {
        let err = PatternInput::parse("Rose", None, Some("0"), Some("10"), None, None).unwrap_err();
        assert_eq!(err.to_string(), "Width must be positive");
    }

    #[test]
    fn test_pattern_input_rejects_oversized_dimensions() {
        let err = PatternInput::parse("Rose", None, Some("10"), Some("10000000000"), None, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Height must be at most 10000 stitches");
        assert!(PatternInput::parse("Rose", None, Some("10000"), Some("10000"), None, None).is_ok());
    }

    #[test]
    fn test_stitch_count_never_overflows() {
        let mut pattern = Pattern {
            id: 1,
            user_id: 1,
            name: "Rose".to_string(),
            designer: None,
            width: Some(120),
            height: Some(80),
            fabric: None,
            notes: None,
            created_at: TimeMs::new(0),
            updated_at: TimeMs::new(0),
        };
        assert_eq!(pattern.stitch_count(), Some(9_600));

        pattern.width = Some(10_000_000_000);
        pattern.height = Some(10_000_000_000);
        assert_eq!(pattern.stitch_count(), None);
    }

    #[test]
    fn test_pattern_input_blank_optionals() {
        let input =
            PatternInput::parse("Rose", Some(""), Some(""), Some(" "), None, Some("")).unwrap();
        assert_eq!(input.name, "Rose");
        assert_eq!(input.designer, None);
        assert_eq!(input.width, None);
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_stitch_count() {
        let pattern = Pattern {
            id: 1,
            user_id: 1,
            name: "Rose".to_string(),
            designer: None,
            width: Some(100),
            height: Some(50),
            fabric: None,
            notes: None,
            created_at: TimeMs::new(0),
            updated_at: TimeMs::new(0),
        };
        assert_eq!(pattern.stitch_count(), Some(5000));
    }
}
