//! Shopping list items.

use super::floss::add_inventory_conn;
use super::{color_from_row, Repository, COLOR_COLUMNS};
use crate::domain::{ShoppingListItem, Shortage, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn item_from_row(row: &SqliteRow) -> Result<ShoppingListItem, sqlx::Error> {
    Ok(ShoppingListItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        color: color_from_row(row)?,
        quantity: row.try_get("quantity")?,
        purchased: row.try_get("purchased")?,
        note: row.try_get("note")?,
        created_at: TimeMs::new(row.try_get("created_at_ms")?),
    })
}

/// Add to the open item for a color, or open a new one.
async fn add_item_conn(
    conn: &mut sqlx::SqliteConnection,
    user_id: i64,
    floss_color_id: i64,
    quantity: i64,
    note: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let now = TimeMs::now().as_i64();
    let merged = sqlx::query(
        r#"
        UPDATE shopping_list_items
        SET quantity = quantity + ?, note = COALESCE(?, note), updated_at_ms = ?
        WHERE user_id = ? AND floss_color_id = ? AND purchased = 0
        "#,
    )
    .bind(quantity)
    .bind(note)
    .bind(now)
    .bind(user_id)
    .bind(floss_color_id)
    .execute(&mut *conn)
    .await?;

    if merged.rows_affected() > 0 {
        let row = sqlx::query(
            "SELECT id FROM shopping_list_items WHERE user_id = ? AND floss_color_id = ? AND purchased = 0",
        )
        .bind(user_id)
        .bind(floss_color_id)
        .fetch_one(&mut *conn)
        .await?;
        return row.try_get("id");
    }

    let id = sqlx::query(
        r#"
        INSERT INTO shopping_list_items (user_id, floss_color_id, quantity, purchased, note, created_at_ms, updated_at_ms)
        VALUES (?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(floss_color_id)
    .bind(quantity)
    .bind(note)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

impl Repository {
    /// Add `quantity` skeins of a color to the list. Returns the item id.
    pub async fn add_shopping_item(
        &self,
        user_id: i64,
        floss_color_id: i64,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = add_item_conn(&mut *tx, user_id, floss_color_id, quantity, note).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Add every shortage to the list in one transaction.
    ///
    /// Returns the number of colors added.
    pub async fn add_shortages_to_shopping_list(
        &self,
        user_id: i64,
        shortages: &[Shortage],
        note: Option<&str>,
    ) -> Result<usize, sqlx::Error> {
        if shortages.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for shortage in shortages {
            add_item_conn(&mut *tx, user_id, shortage.color.id, shortage.missing, note).await?;
        }
        tx.commit().await?;
        Ok(shortages.len())
    }

    /// Open items first, then purchased ones; each group in color order.
    pub async fn list_shopping_items(
        &self,
        user_id: i64,
    ) -> Result<Vec<ShoppingListItem>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT sli.id, sli.user_id, sli.quantity, sli.purchased, sli.note, sli.created_at_ms, {}
            FROM shopping_list_items sli
            JOIN floss_colors fc ON fc.id = sli.floss_color_id
            WHERE sli.user_id = ?
            ORDER BY sli.purchased, fc.brand,
              CASE WHEN fc.color_number GLOB '[0-9]*' THEN 0 ELSE 1 END,
              CAST(fc.color_number AS INTEGER),
              fc.color_number
            "#,
            COLOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }

    pub async fn get_shopping_item(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<ShoppingListItem>, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            SELECT sli.id, sli.user_id, sli.quantity, sli.purchased, sli.note, sli.created_at_ms, {}
            FROM shopping_list_items sli
            JOIN floss_colors fc ON fc.id = sli.floss_color_id
            WHERE sli.user_id = ? AND sli.id = ?
            "#,
            COLOR_COLUMNS
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    /// Mark an open item purchased and add its quantity to the stash, both
    /// or neither.
    ///
    /// Returns false if the item is missing, someone else's, or already
    /// purchased.
    pub async fn purchase_shopping_item(&self, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE shopping_list_items SET purchased = 1, updated_at_ms = ? WHERE user_id = ? AND id = ? AND purchased = 0",
        )
        .bind(TimeMs::now().as_i64())
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        let row = sqlx::query("SELECT floss_color_id, quantity FROM shopping_list_items WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let floss_color_id: i64 = row.try_get("floss_color_id")?;
        let quantity: i64 = row.try_get("quantity")?;

        add_inventory_conn(&mut *tx, user_id, floss_color_id, quantity, None).await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_shopping_item(&self, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shopping_list_items WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every purchased item. Returns how many were removed.
    pub async fn clear_purchased_items(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM shopping_list_items WHERE user_id = ? AND purchased = 1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
