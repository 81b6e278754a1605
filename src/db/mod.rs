//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization, migrations and destructive reset
//! - SQLite pragma configuration
//! - Repository layer for database operations

pub mod migrations;
pub mod repo;

pub use migrations::{drop_all_tables, init_db, recreate_schema};
pub use repo::Repository;
