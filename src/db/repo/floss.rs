//! Floss color reference data and per-user inventory.

use super::{color_from_row, Repository, COLOR_COLUMNS};
use crate::domain::{FlossColor, InventoryItem, NewFlossColor, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;

fn inventory_from_row(row: &SqliteRow) -> Result<InventoryItem, sqlx::Error> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        color: color_from_row(row)?,
        quantity: row.try_get("quantity")?,
        location: row.try_get("location")?,
        updated_at: TimeMs::new(row.try_get("updated_at_ms")?),
    })
}

impl Repository {
    // =========================================================================
    // Floss color operations
    // =========================================================================

    /// Insert a single floss color.
    ///
    /// # Errors
    /// A duplicate `(brand, color_number)` surfaces as a unique violation.
    pub async fn insert_floss_color(&self, color: &NewFlossColor) -> Result<FlossColor, sqlx::Error> {
        let now = TimeMs::now().as_i64();
        let id = sqlx::query(
            r#"
            INSERT INTO floss_colors (brand, color_number, color_name, hex_color, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&color.brand)
        .bind(&color.color_number)
        .bind(color.color_name.as_deref())
        .bind(color.hex_color.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(FlossColor {
            id,
            brand: color.brand.clone(),
            color_number: color.color_number.clone(),
            color_name: color.color_name.clone(),
            hex_color: color.hex_color.clone(),
        })
    }

    /// Insert many colors in a single transaction, skipping ones that already
    /// exist.
    ///
    /// Returns the number of newly inserted colors.
    pub async fn insert_floss_colors_batch(
        &self,
        colors: &[NewFlossColor],
    ) -> Result<usize, sqlx::Error> {
        if colors.is_empty() {
            return Ok(0);
        }

        let now = TimeMs::now().as_i64();
        let mut total_inserted = 0usize;
        let mut tx = self.pool.begin().await?;

        for color in colors {
            let result = sqlx::query(
                r#"
                INSERT INTO floss_colors (brand, color_number, color_name, hex_color, created_at_ms, updated_at_ms)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(brand, color_number) DO NOTHING
                "#,
            )
            .bind(&color.brand)
            .bind(&color.color_number)
            .bind(color.color_name.as_deref())
            .bind(color.hex_color.as_deref())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                total_inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(total_inserted)
    }

    /// Count colors, optionally restricted to one brand.
    pub async fn count_floss_colors(&self, brand: Option<&str>) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM floss_colors WHERE (? IS NULL OR brand = ?)",
        )
        .bind(brand)
        .bind(brand)
        .fetch_one(&self.pool)
        .await?;
        row.try_get("n")
    }

    pub async fn get_floss_color(&self, id: i64) -> Result<Option<FlossColor>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM floss_colors fc WHERE fc.id = ?",
            COLOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(color_from_row).transpose()
    }

    /// Look a color up by brand and number, ignoring case ("b5200" finds "B5200").
    pub async fn find_floss_color(
        &self,
        brand: &str,
        color_number: &str,
    ) -> Result<Option<FlossColor>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM floss_colors fc WHERE fc.brand = ? AND fc.color_number = ? COLLATE NOCASE",
            COLOR_COLUMNS
        ))
        .bind(brand)
        .bind(color_number.trim())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(color_from_row).transpose()
    }

    /// Search by number prefix or name substring.
    ///
    /// Exact number matches sort first, then numeric numbers in numeric order,
    /// then the rest alphabetically.
    pub async fn search_floss_colors(
        &self,
        query: Option<&str>,
        brand: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FlossColor>, sqlx::Error> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let number_prefix = query.map(|q| format!("{}%", escape_like(q)));
        let name_like = query.map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM floss_colors fc
            WHERE (? IS NULL OR fc.brand = ?)
              AND (? IS NULL OR fc.color_number LIKE ? ESCAPE '\' OR fc.color_name LIKE ? ESCAPE '\')
            ORDER BY
              CASE WHEN fc.color_number = ? COLLATE NOCASE THEN 0 ELSE 1 END,
              fc.brand,
              CASE WHEN fc.color_number GLOB '[0-9]*' THEN 0 ELSE 1 END,
              CAST(fc.color_number AS INTEGER),
              fc.color_number
            LIMIT ?
            "#,
            COLOR_COLUMNS
        ))
        .bind(brand)
        .bind(brand)
        .bind(query)
        .bind(number_prefix.as_deref())
        .bind(name_like.as_deref())
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(color_from_row).collect()
    }

    /// Distinct brands in the reference table.
    pub async fn list_floss_brands(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query("SELECT DISTINCT brand FROM floss_colors ORDER BY brand")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| r.try_get("brand")).collect()
    }

    // =========================================================================
    // Inventory operations
    // =========================================================================

    pub async fn list_inventory(&self, user_id: i64) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT fi.id, fi.user_id, fi.quantity, fi.location, fi.updated_at_ms, {}
            FROM floss_inventory fi
            JOIN floss_colors fc ON fc.id = fi.floss_color_id
            WHERE fi.user_id = ?
            ORDER BY fc.brand,
              CASE WHEN fc.color_number GLOB '[0-9]*' THEN 0 ELSE 1 END,
              CAST(fc.color_number AS INTEGER),
              fc.color_number
            "#,
            COLOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(inventory_from_row).collect()
    }

    pub async fn get_inventory_item(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            SELECT fi.id, fi.user_id, fi.quantity, fi.location, fi.updated_at_ms, {}
            FROM floss_inventory fi
            JOIN floss_colors fc ON fc.id = fi.floss_color_id
            WHERE fi.user_id = ? AND fi.id = ?
            "#,
            COLOR_COLUMNS
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(inventory_from_row).transpose()
    }

    /// Add skeins of a color to the stash. An existing entry grows by
    /// `quantity`; a given location replaces the stored one.
    ///
    /// Returns the id of the inventory row.
    pub async fn add_inventory(
        &self,
        user_id: i64,
        floss_color_id: i64,
        quantity: i64,
        location: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = add_inventory_conn(&mut *tx, user_id, floss_color_id, quantity, location).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Overwrite quantity and location. Returns false if the row is missing
    /// or belongs to someone else.
    pub async fn update_inventory(
        &self,
        user_id: i64,
        id: i64,
        quantity: i64,
        location: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE floss_inventory
            SET quantity = ?, location = ?, updated_at_ms = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(quantity)
        .bind(location)
        .bind(TimeMs::now().as_i64())
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_inventory(&self, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM floss_inventory WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Skeins on hand keyed by floss color id.
    pub async fn owned_quantities(&self, user_id: i64) -> Result<HashMap<i64, i64>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT floss_color_id, quantity FROM floss_inventory WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> Result<(i64, i64), sqlx::Error> {
                Ok((r.try_get("floss_color_id")?, r.try_get("quantity")?))
            })
            .collect()
    }
}

/// Upsert into the stash on an existing connection so it can take part in a
/// caller's transaction.
pub(crate) async fn add_inventory_conn(
    conn: &mut sqlx::SqliteConnection,
    user_id: i64,
    floss_color_id: i64,
    quantity: i64,
    location: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let now = TimeMs::now().as_i64();
    sqlx::query(
        r#"
        INSERT INTO floss_inventory (user_id, floss_color_id, quantity, location, created_at_ms, updated_at_ms)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, floss_color_id) DO UPDATE SET
            quantity = quantity + excluded.quantity,
            location = COALESCE(excluded.location, location),
            updated_at_ms = excluded.updated_at_ms
        "#,
    )
    .bind(user_id)
    .bind(floss_color_id)
    .bind(quantity)
    .bind(location)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query(
        "SELECT id FROM floss_inventory WHERE user_id = ? AND floss_color_id = ?",
    )
    .bind(user_id)
    .bind(floss_color_id)
    .fetch_one(&mut *conn)
    .await?;
    row.try_get("id")
}

/// Escape `LIKE` wildcards so user input matches literally under
/// `ESCAPE '\'`.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
