//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by aggregate:
//! - `floss.rs` - Floss color reference data and the per-user stash
//! - `patterns.rs` - Patterns and their floss requirements
//! - `projects.rs` - Projects and work sessions
//! - `shopping.rs` - Shopping list items
//!
//! Users and login sessions live here. Every query on user-owned data
//! filters on `user_id`, so a record belonging to someone else behaves
//! exactly like a missing one.

mod floss;
mod patterns;
mod projects;
mod shopping;

use crate::domain::{FlossColor, TimeMs, User};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

pub use projects::ActiveSession;

/// Columns selected for a joined `floss_colors fc` row.
pub(crate) const COLOR_COLUMNS: &str = "fc.id AS fc_id, fc.brand AS fc_brand, fc.color_number AS fc_color_number, fc.color_name AS fc_color_name, fc.hex_color AS fc_hex_color";

/// Read a floss color selected with [`COLOR_COLUMNS`].
pub(crate) fn color_from_row(row: &SqliteRow) -> Result<FlossColor, sqlx::Error> {
    Ok(FlossColor {
        id: row.try_get("fc_id")?,
        brand: row.try_get("fc_brand")?,
        color_number: row.try_get("fc_color_number")?,
        color_name: row.try_get("fc_color_name")?,
        hex_color: row.try_get("fc_hex_color")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: TimeMs::new(row.try_get("created_at_ms")?),
        updated_at: TimeMs::new(row.try_get("updated_at_ms")?),
    })
}

/// A persisted login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSessionRow {
    pub user_id: i64,
    pub expires_at: TimeMs,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Underlying pool, for readiness checks and maintenance tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // User operations
    // =========================================================================

    /// Insert a user. Duplicate usernames or emails surface as a unique
    /// violation from the database.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let now = TimeMs::now();
        let id = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, created_at_ms, updated_at_ms)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now.as_i64())
        .bind(now.as_i64())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn count_users(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("n")
    }

    // =========================================================================
    // Login session operations
    // =========================================================================

    pub async fn insert_auth_session(
        &self,
        token_hash: &str,
        user_id: i64,
        created_at: TimeMs,
        expires_at: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (token_hash, user_id, created_at_ms, expires_at_ms)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(created_at.as_i64())
        .bind(expires_at.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_auth_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<AuthSessionRow>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT user_id, expires_at_ms FROM auth_sessions WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<AuthSessionRow, sqlx::Error> {
            Ok(AuthSessionRow {
                user_id: r.try_get("user_id")?,
                expires_at: TimeMs::new(r.try_get("expires_at_ms")?),
            })
        })
        .transpose()
    }

    /// Returns true if a session was removed.
    pub async fn delete_auth_session(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that expired before `now`.
    pub async fn purge_expired_auth_sessions(&self, now: TimeMs) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < ?")
            .bind(now.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
