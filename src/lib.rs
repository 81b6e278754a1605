pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod render;
pub mod seed;

pub use auth::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    FlossColor, InventoryItem, Pattern, PatternFloss, Project, ProjectStatus, ShoppingListItem,
    TimeMs, User, WorkSession,
};
pub use error::AppError;

/// Install the fmt subscriber used by every binary. `RUST_LOG` overrides the
/// INFO default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();
}
