//! Projects and their work sessions.

use super::Repository;
use crate::domain::project::status_timestamps;
use crate::domain::{Project, ProjectInput, ProjectStatus, TimeMs, WorkSession};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

const PROJECT_SELECT: &str = r#"
    SELECT pr.id, pr.user_id, pr.pattern_id, pr.name, pr.status, pr.started_at_ms,
           pr.completed_at_ms, pr.notes, pr.created_at_ms, pr.updated_at_ms,
           p.name AS pattern_name
    FROM projects pr
    JOIN patterns p ON p.id = pr.pattern_id
"#;

/// A running timer together with the project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub project_id: i64,
    pub project_name: String,
    pub session: WorkSession,
}

fn project_from_row(row: &SqliteRow) -> Result<Project, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = ProjectStatus::from_str(&status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Project {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pattern_id: row.try_get("pattern_id")?,
        pattern_name: row.try_get("pattern_name")?,
        name: row.try_get("name")?,
        status,
        started_at: row.try_get::<Option<i64>, _>("started_at_ms")?.map(TimeMs::new),
        completed_at: row
            .try_get::<Option<i64>, _>("completed_at_ms")?
            .map(TimeMs::new),
        notes: row.try_get("notes")?,
        created_at: TimeMs::new(row.try_get("created_at_ms")?),
        updated_at: TimeMs::new(row.try_get("updated_at_ms")?),
    })
}

fn session_from_row(row: &SqliteRow) -> Result<WorkSession, sqlx::Error> {
    Ok(WorkSession {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        started_at: TimeMs::new(row.try_get("started_at_ms")?),
        ended_at: row.try_get::<Option<i64>, _>("ended_at_ms")?.map(TimeMs::new),
        stitches: row.try_get("stitches")?,
        notes: row.try_get("notes")?,
    })
}

/// Move a `planned` project to `in_progress` inside the caller's transaction.
async fn mark_started(
    conn: &mut sqlx::SqliteConnection,
    project: &Project,
    now: TimeMs,
) -> Result<(), sqlx::Error> {
    if project.status != ProjectStatus::Planned {
        return Ok(());
    }
    let (started_at, _) = status_timestamps(project.started_at, ProjectStatus::InProgress, now);
    sqlx::query(
        "UPDATE projects SET status = ?, started_at_ms = ?, updated_at_ms = ? WHERE id = ?",
    )
    .bind(ProjectStatus::InProgress.as_str())
    .bind(started_at.map(|t| t.as_i64()))
    .bind(now.as_i64())
    .bind(project.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl Repository {
    /// Create a project in the `planned` state. Callers check that the
    /// pattern belongs to `user_id`.
    pub async fn create_project(
        &self,
        user_id: i64,
        input: &ProjectInput,
    ) -> Result<i64, sqlx::Error> {
        let now = TimeMs::now().as_i64();
        let id = sqlx::query(
            r#"
            INSERT INTO projects (user_id, pattern_id, name, status, notes, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(input.pattern_id)
        .bind(&input.name)
        .bind(ProjectStatus::Planned.as_str())
        .bind(input.notes.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// A user's projects, most recently touched first.
    pub async fn list_projects(
        &self,
        user_id: i64,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query(&format!(
            "{} WHERE pr.user_id = ? AND (? IS NULL OR pr.status = ?) ORDER BY pr.updated_at_ms DESC, pr.id DESC",
            PROJECT_SELECT
        ))
        .bind(user_id)
        .bind(status)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn list_projects_for_pattern(
        &self,
        user_id: i64,
        pattern_id: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "{} WHERE pr.user_id = ? AND pr.pattern_id = ? ORDER BY pr.id",
            PROJECT_SELECT
        ))
        .bind(user_id)
        .bind(pattern_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn get_project(&self, user_id: i64, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "{} WHERE pr.user_id = ? AND pr.id = ?",
            PROJECT_SELECT
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    /// Returns false if the project is missing or owned by someone else.
    pub async fn update_project(
        &self,
        user_id: i64,
        id: i64,
        input: &ProjectInput,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET pattern_id = ?, name = ?, notes = ?, updated_at_ms = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(input.pattern_id)
        .bind(&input.name)
        .bind(input.notes.as_deref())
        .bind(TimeMs::now().as_i64())
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change status and its timestamps. Completing a project also stops
    /// its running timer.
    pub async fn set_project_status(
        &self,
        project: &Project,
        status: ProjectStatus,
        now: TimeMs,
    ) -> Result<(), sqlx::Error> {
        let (started_at, completed_at) = status_timestamps(project.started_at, status, now);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE projects
            SET status = ?, started_at_ms = ?, completed_at_ms = ?, updated_at_ms = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(started_at.map(|t| t.as_i64()))
        .bind(completed_at.map(|t| t.as_i64()))
        .bind(now.as_i64())
        .bind(project.id)
        .execute(&mut *tx)
        .await?;

        if status == ProjectStatus::Completed {
            sqlx::query(
                r#"
                UPDATE work_sessions
                SET ended_at_ms = MAX(?, started_at_ms), updated_at_ms = ?
                WHERE project_id = ? AND ended_at_ms IS NULL
                "#,
            )
            .bind(now.as_i64())
            .bind(now.as_i64())
            .bind(project.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Delete a project together with its sessions.
    pub async fn delete_project(&self, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Project counts per status for a user; statuses without projects are 0.
    pub async fn count_projects_by_status(
        &self,
        user_id: i64,
    ) -> Result<Vec<(ProjectStatus, i64)>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS n FROM projects WHERE user_id = ? GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: Vec<(ProjectStatus, i64)> =
            ProjectStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for row in rows {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            if let Ok(status) = ProjectStatus::from_str(&status) {
                if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
                    entry.1 = n;
                }
            }
        }
        Ok(counts)
    }

    // =========================================================================
    // Work session operations
    // =========================================================================

    /// Start a timer. A `planned` project moves to `in_progress`.
    ///
    /// # Errors
    /// A second active timer for the project surfaces as a unique violation.
    pub async fn start_session(
        &self,
        project: &Project,
        now: TimeMs,
    ) -> Result<WorkSession, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO work_sessions (project_id, started_at_ms, stitches, created_at_ms, updated_at_ms)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(project.id)
        .bind(now.as_i64())
        .bind(now.as_i64())
        .bind(now.as_i64())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        mark_started(&mut *tx, project, now).await?;
        tx.commit().await?;

        Ok(WorkSession {
            id,
            project_id: project.id,
            started_at: now,
            ended_at: None,
            stitches: 0,
            notes: None,
        })
    }

    pub async fn active_session(&self, project_id: i64) -> Result<Option<WorkSession>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM work_sessions WHERE project_id = ? AND ended_at_ms IS NULL",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    /// Stop the running timer, recording stitches and notes.
    ///
    /// Returns `None` when no timer was running.
    pub async fn stop_session(
        &self,
        project_id: i64,
        now: TimeMs,
        stitches: i64,
        notes: Option<&str>,
    ) -> Result<Option<WorkSession>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let running = sqlx::query(
            "SELECT id FROM work_sessions WHERE project_id = ? AND ended_at_ms IS NULL",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(running) = running else {
            return Ok(None);
        };
        let id: i64 = running.try_get("id")?;

        sqlx::query(
            r#"
            UPDATE work_sessions
            SET ended_at_ms = MAX(?, started_at_ms), stitches = ?, notes = ?, updated_at_ms = ?
            WHERE id = ?
            "#,
        )
        .bind(now.as_i64())
        .bind(stitches)
        .bind(notes)
        .bind(now.as_i64())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query("SELECT * FROM work_sessions WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        session_from_row(&row).map(Some)
    }

    /// Record a finished session after the fact. A `planned` project moves
    /// to `in_progress`.
    pub async fn log_session(
        &self,
        project: &Project,
        started_at: TimeMs,
        ended_at: TimeMs,
        stitches: i64,
        notes: Option<&str>,
    ) -> Result<WorkSession, sqlx::Error> {
        let now = TimeMs::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO work_sessions (project_id, started_at_ms, ended_at_ms, stitches, notes, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id)
        .bind(started_at.as_i64())
        .bind(ended_at.as_i64())
        .bind(stitches)
        .bind(notes)
        .bind(now.as_i64())
        .bind(now.as_i64())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        mark_started(&mut *tx, project, started_at).await?;
        tx.commit().await?;

        Ok(WorkSession {
            id,
            project_id: project.id,
            started_at,
            ended_at: Some(ended_at),
            stitches,
            notes: notes.map(str::to_string),
        })
    }

    /// Sessions of a project, newest first. Callers check project ownership.
    pub async fn list_sessions(&self, project_id: i64) -> Result<Vec<WorkSession>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM work_sessions WHERE project_id = ? ORDER BY started_at_ms DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(session_from_row).collect()
    }

    pub async fn delete_session(&self, project_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_sessions WHERE project_id = ? AND id = ?")
            .bind(project_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every running timer of a user.
    pub async fn active_sessions_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ActiveSession>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT ws.*, pr.name AS project_name
            FROM work_sessions ws
            JOIN projects pr ON pr.id = ws.project_id
            WHERE pr.user_id = ? AND ws.ended_at_ms IS NULL
            ORDER BY ws.started_at_ms
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ActiveSession, sqlx::Error> {
                let session = session_from_row(row)?;
                Ok(ActiveSession {
                    project_id: session.project_id,
                    project_name: row.try_get("project_name")?,
                    session,
                })
            })
            .collect()
    }
}
