//! Patterns and their floss requirements.

use super::{color_from_row, Repository, COLOR_COLUMNS};
use crate::domain::{Pattern, PatternFloss, PatternInput, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn pattern_from_row(row: &SqliteRow) -> Result<Pattern, sqlx::Error> {
    Ok(Pattern {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        designer: row.try_get("designer")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        fabric: row.try_get("fabric")?,
        notes: row.try_get("notes")?,
        created_at: TimeMs::new(row.try_get("created_at_ms")?),
        updated_at: TimeMs::new(row.try_get("updated_at_ms")?),
    })
}

fn pattern_floss_from_row(row: &SqliteRow) -> Result<PatternFloss, sqlx::Error> {
    Ok(PatternFloss {
        id: row.try_get("id")?,
        pattern_id: row.try_get("pattern_id")?,
        color: color_from_row(row)?,
        skeins_required: row.try_get("skeins_required")?,
    })
}

impl Repository {
    pub async fn create_pattern(
        &self,
        user_id: i64,
        input: &PatternInput,
    ) -> Result<Pattern, sqlx::Error> {
        let now = TimeMs::now();
        let id = sqlx::query(
            r#"
            INSERT INTO patterns (user_id, name, designer, width, height, fabric, notes, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(input.designer.as_deref())
        .bind(input.width)
        .bind(input.height)
        .bind(input.fabric.as_deref())
        .bind(input.notes.as_deref())
        .bind(now.as_i64())
        .bind(now.as_i64())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Pattern {
            id,
            user_id,
            name: input.name.clone(),
            designer: input.designer.clone(),
            width: input.width,
            height: input.height,
            fabric: input.fabric.clone(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// A user's patterns, newest first.
    pub async fn list_patterns(&self, user_id: i64) -> Result<Vec<Pattern>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM patterns WHERE user_id = ? ORDER BY created_at_ms DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(pattern_from_row).collect()
    }

    pub async fn get_pattern(&self, user_id: i64, id: i64) -> Result<Option<Pattern>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM patterns WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pattern_from_row).transpose()
    }

    /// Returns false if the pattern is missing or owned by someone else.
    pub async fn update_pattern(
        &self,
        user_id: i64,
        id: i64,
        input: &PatternInput,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE patterns
            SET name = ?, designer = ?, width = ?, height = ?, fabric = ?, notes = ?, updated_at_ms = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&input.name)
        .bind(input.designer.as_deref())
        .bind(input.width)
        .bind(input.height)
        .bind(input.fabric.as_deref())
        .bind(input.notes.as_deref())
        .bind(TimeMs::now().as_i64())
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a pattern and its requirements.
    ///
    /// # Errors
    /// Fails with a foreign key violation while projects still use it.
    pub async fn delete_pattern(&self, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM patterns WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_projects_for_pattern(&self, pattern_id: i64) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM projects WHERE pattern_id = ?")
            .bind(pattern_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_get("n")
    }

    // =========================================================================
    // Requirement operations
    // =========================================================================

    /// Set how many skeins of a color the pattern needs, replacing any
    /// previous count for that color.
    pub async fn upsert_pattern_floss(
        &self,
        pattern_id: i64,
        floss_color_id: i64,
        skeins_required: i64,
    ) -> Result<i64, sqlx::Error> {
        let now = TimeMs::now().as_i64();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO pattern_floss (pattern_id, floss_color_id, skeins_required, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(pattern_id, floss_color_id) DO UPDATE SET
                skeins_required = excluded.skeins_required,
                updated_at_ms = excluded.updated_at_ms
            "#,
        )
        .bind(pattern_id)
        .bind(floss_color_id)
        .bind(skeins_required)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            "SELECT id FROM pattern_floss WHERE pattern_id = ? AND floss_color_id = ?",
        )
        .bind(pattern_id)
        .bind(floss_color_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        row.try_get("id")
    }

    /// Requirements in color order. Callers check pattern ownership first.
    pub async fn list_pattern_floss(&self, pattern_id: i64) -> Result<Vec<PatternFloss>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT pf.id, pf.pattern_id, pf.skeins_required, {}
            FROM pattern_floss pf
            JOIN floss_colors fc ON fc.id = pf.floss_color_id
            WHERE pf.pattern_id = ?
            ORDER BY fc.brand,
              CASE WHEN fc.color_number GLOB '[0-9]*' THEN 0 ELSE 1 END,
              CAST(fc.color_number AS INTEGER),
              fc.color_number
            "#,
            COLOR_COLUMNS
        ))
        .bind(pattern_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(pattern_floss_from_row).collect()
    }

    pub async fn delete_pattern_floss(&self, pattern_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pattern_floss WHERE pattern_id = ? AND id = ?")
            .bind(pattern_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
