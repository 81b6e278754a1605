//! Projects (a pattern being stitched) and their work sessions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{optional_text, required_text, TimeMs, ValidationError};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Planned,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
    ];

    /// Value stored in the database and used in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "planned",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "Planned",
            ProjectStatus::InProgress => "In progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(ProjectStatus::Planned),
            "in_progress" | "in-progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            other => Err(ValidationError::new(format!(
                "Unknown project status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub pattern_id: i64,
    /// Denormalized from the joined pattern row.
    pub pattern_name: String,
    pub name: String,
    pub status: ProjectStatus,
    pub started_at: Option<TimeMs>,
    pub completed_at: Option<TimeMs>,
    pub notes: Option<String>,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

/// Validated create/update fields for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInput {
    pub pattern_id: i64,
    pub name: String,
    pub notes: Option<String>,
}

impl ProjectInput {
    pub fn parse(pattern_id: &str, name: &str, notes: Option<&str>) -> Result<Self, ValidationError> {
        let pattern_id = pattern_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::new("Choose a pattern"))?;
        Ok(ProjectInput {
            pattern_id,
            name: required_text("Name", name, 200)?,
            notes: optional_text("Notes", notes, 2000)?,
        })
    }
}

/// Timestamps to write when a project moves to `next`.
///
/// Returns `(started_at, completed_at)`: entering `in_progress` stamps a start
/// time when none exists, entering `completed` stamps completion, and every
/// other status clears completion.
pub fn status_timestamps(
    current_started: Option<TimeMs>,
    next: ProjectStatus,
    now: TimeMs,
) -> (Option<TimeMs>, Option<TimeMs>) {
    match next {
        ProjectStatus::Planned => (current_started, None),
        ProjectStatus::InProgress => (Some(current_started.unwrap_or(now)), None),
        ProjectStatus::Completed => (Some(current_started.unwrap_or(now)), Some(now)),
    }
}

/// A stitching session. Active while `ended_at` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSession {
    pub id: i64,
    pub project_id: i64,
    pub started_at: TimeMs,
    pub ended_at: Option<TimeMs>,
    pub stitches: i64,
    pub notes: Option<String>,
}

impl WorkSession {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Elapsed seconds; an active session counts up to `now`.
    pub fn duration_secs(&self, now: TimeMs) -> i64 {
        self.started_at.secs_until(self.ended_at.unwrap_or(now))
    }
}

/// Aggregates over a project's sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectTotals {
    pub session_count: i64,
    pub total_secs: i64,
    pub stitches: i64,
}

impl ProjectTotals {
    pub fn from_sessions(sessions: &[WorkSession], now: TimeMs) -> Self {
        sessions
            .iter()
            .fold(ProjectTotals::default(), |mut acc, session| {
                acc.session_count += 1;
                acc.total_secs = acc.total_secs.saturating_add(session.duration_secs(now));
                acc.stitches = acc.stitches.saturating_add(session.stitches);
                acc
            })
    }

    /// Percentage of the pattern stitched, capped at 100. `None` when the
    /// pattern size is unknown.
    pub fn progress_percent(&self, stitch_count: Option<i64>) -> Option<u8> {
        let total = stitch_count.filter(|t| *t > 0)?;
        let pct = (self.stitches.max(0).saturating_mul(100) / total).min(100);
        Some(pct as u8)
    }
}
