//! Reference and development data seeding, and the destructive reset.
//!
//! Every seeding step is repeatable: when its data is already present it
//! reports [`SeedOutcome::Skipped`] and writes nothing.

use crate::auth::hash_password;
use crate::db::{recreate_schema, Repository};
use crate::domain::floss::DMC_BRAND;
use crate::domain::{NewFlossColor, PatternInput, ProjectInput, ValidationError};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// DMC catalog compiled into the binary.
pub const BUNDLED_DMC_CATALOG: &str = include_str!("../../data/dmc_colors.json");

pub const DEV_PASSWORD: &str = "password123";
pub const DEV_USERS: [(&str, &str); 2] = [
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
];

pub const RESET_PROMPT: &str = "This will DELETE ALL DATA. Are you sure? (yes/no): ";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid color catalog: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error("Invalid catalog entry {index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted(usize),
    /// Data was already present; `existing` rows were found.
    Skipped { existing: i64 },
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    color_number: String,
    color_name: Option<String>,
    hex_color: Option<String>,
}

/// Parse a JSON array of `{color_number, color_name, hex_color}` into
/// validated DMC colors.
pub fn parse_catalog(json: &str) -> Result<Vec<NewFlossColor>, SeedError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            NewFlossColor {
                brand: DMC_BRAND.to_string(),
                color_number: entry.color_number,
                color_name: entry.color_name,
                hex_color: entry.hex_color,
            }
            .validated()
            .map_err(|source| SeedError::Entry { index, source })
        })
        .collect()
}

/// Load the catalog from `path`, or the bundled one.
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<NewFlossColor>, SeedError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_catalog(&json)
        }
        None => parse_catalog(BUNDLED_DMC_CATALOG),
    }
}

/// Insert the DMC colors unless any DMC color already exists.
pub async fn seed_dmc_colors(
    repo: &Repository,
    colors: &[NewFlossColor],
) -> Result<SeedOutcome, SeedError> {
    let existing = repo.count_floss_colors(Some(DMC_BRAND)).await?;
    if existing > 0 {
        info!(existing, "DMC colors already seeded, skipping");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let inserted = repo.insert_floss_colors_batch(colors).await?;
    info!(inserted, "Seeded DMC colors");
    Ok(SeedOutcome::Inserted(inserted))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevSeedReport {
    pub users: SeedOutcome,
    pub samples: SeedOutcome,
}

/// Create the example users, then sample records for alice.
pub async fn seed_dev_data(repo: &Repository) -> Result<DevSeedReport, SeedError> {
    let users = seed_users(repo).await?;
    let samples = seed_samples(repo).await?;
    Ok(DevSeedReport { users, samples })
}

async fn seed_users(repo: &Repository) -> Result<SeedOutcome, SeedError> {
    let existing = repo.count_users().await?;
    if existing > 0 {
        info!(existing, "Users already seeded, skipping");
        return Ok(SeedOutcome::Skipped { existing });
    }

    for (username, email) in DEV_USERS {
        let hash = hash_password(DEV_PASSWORD).map_err(|e| SeedError::Hash(e.to_string()))?;
        let user = repo.create_user(username, email, &hash).await?;
        info!(user_id = user.id, username, "Seeded user");
    }
    Ok(SeedOutcome::Inserted(DEV_USERS.len()))
}

/// A sample pattern, stash and project for alice. Colors missing from the
/// catalog are left out.
async fn seed_samples(repo: &Repository) -> Result<SeedOutcome, SeedError> {
    let Some(alice) = repo.get_user_by_username(DEV_USERS[0].0).await? else {
        return Ok(SeedOutcome::Skipped { existing: 0 });
    };
    let existing = repo.list_patterns(alice.id).await?.len() as i64;
    if existing > 0 {
        info!(existing, "Sample data already present, skipping");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let pattern = repo
        .create_pattern(
            alice.id,
            &PatternInput {
                name: "Spring Meadow Sampler".to_string(),
                designer: Some("Example Designs".to_string()),
                width: Some(120),
                height: Some(80),
                fabric: Some("14 count Aida, white".to_string()),
                notes: None,
            },
        )
        .await?;

    let mut records = 1;
    for (number, skeins, owned) in [("310", 2, 3), ("321", 1, 1), ("699", 2, 0), ("3865", 1, 0)] {
        let Some(color) = repo.find_floss_color(DMC_BRAND, number).await? else {
            continue;
        };
        repo.upsert_pattern_floss(pattern.id, color.id, skeins).await?;
        records += 1;
        if owned > 0 {
            repo.add_inventory(alice.id, color.id, owned, Some("Box A"))
                .await?;
            records += 1;
        }
    }

    repo.create_project(
        alice.id,
        &ProjectInput {
            pattern_id: pattern.id,
            name: "Sampler for the hallway".to_string(),
            notes: None,
        },
    )
    .await?;
    records += 1;

    info!(user_id = alice.id, records, "Seeded sample data");
    Ok(SeedOutcome::Inserted(records))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    pub colors: SeedOutcome,
    pub dev: DevSeedReport,
}

/// Drop every table, recreate the schema and reseed.
pub async fn reset_database(
    repo: &Repository,
    colors: &[NewFlossColor],
) -> Result<ResetReport, SeedError> {
    recreate_schema(repo.pool()).await?;
    info!("Schema recreated");
    let colors = seed_dmc_colors(repo, colors).await?;
    let dev = seed_dev_data(repo).await?;
    Ok(ResetReport { colors, dev })
}

/// Ask before destroying data. Only `yes` (any case) confirms.
pub fn confirm_reset<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<bool> {
    write!(output, "{}", RESET_PROMPT)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use std::io::Cursor;
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let colors = load_catalog(None).unwrap();
        assert!(colors.len() > 50);
        assert!(colors.iter().all(|c| c.brand == "DMC"));
        let black = colors.iter().find(|c| c.color_number == "310").unwrap();
        assert_eq!(black.color_name.as_deref(), Some("Black"));
        assert_eq!(black.hex_color.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_bundled_catalog_has_unique_numbers() {
        let colors = load_catalog(None).unwrap();
        let mut numbers: Vec<_> = colors.iter().map(|c| c.color_number.as_str()).collect();
        numbers.sort_unstable();
        let before = numbers.len();
        numbers.dedup();
        assert_eq!(before, numbers.len());
    }

    #[test]
    fn test_bundled_catalog_covers_full_dmc_range() {
        let colors = load_catalog(None).unwrap();
        assert!(colors.len() >= 449, "only {} colors", colors.len());
        for number in ["1", "35", "469", "731", "3041", "3609", "3802", "3880", "3895"] {
            assert!(
                colors.iter().any(|c| c.color_number == number),
                "missing DMC {}",
                number
            );
        }
    }

    #[test]
    fn test_parse_catalog_rejects_bad_hex() {
        let err = parse_catalog(r#"[{"color_number": "1", "color_name": "x", "hex_color": "zzz"}]"#)
            .unwrap_err();
        assert!(matches!(err, SeedError::Entry { index: 0, .. }));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog(Some(Path::new("/nonexistent/colors.json"))).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[tokio::test]
    async fn test_seed_dmc_colors_is_repeatable() {
        let (repo, _temp) = setup_repo().await;
        let colors = load_catalog(None).unwrap();

        let first = seed_dmc_colors(&repo, &colors).await.unwrap();
        assert_eq!(first, SeedOutcome::Inserted(colors.len()));

        let second = seed_dmc_colors(&repo, &colors).await.unwrap();
        assert_eq!(
            second,
            SeedOutcome::Skipped {
                existing: colors.len() as i64
            }
        );
        assert_eq!(
            repo.count_floss_colors(Some("DMC")).await.unwrap(),
            colors.len() as i64
        );
    }

    #[tokio::test]
    async fn test_seed_dev_data_is_repeatable() {
        let (repo, _temp) = setup_repo().await;
        seed_dmc_colors(&repo, &load_catalog(None).unwrap())
            .await
            .unwrap();

        let first = seed_dev_data(&repo).await.unwrap();
        assert_eq!(first.users, SeedOutcome::Inserted(2));
        assert!(matches!(first.samples, SeedOutcome::Inserted(_)));

        let second = seed_dev_data(&repo).await.unwrap();
        assert_eq!(second.users, SeedOutcome::Skipped { existing: 2 });
        assert_eq!(second.samples, SeedOutcome::Skipped { existing: 1 });

        let alice = repo.get_user_by_username("alice").await.unwrap().unwrap();
        assert!(crate::auth::verify_password(DEV_PASSWORD, &alice.password_hash));
        assert_eq!(repo.list_projects(alice.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_database_recreates_and_reseeds() {
        let (repo, _temp) = setup_repo().await;
        let colors = load_catalog(None).unwrap();
        repo.create_user("carol", "carol@example.com", "hash")
            .await
            .unwrap();

        let report = reset_database(&repo, &colors).await.unwrap();
        assert_eq!(report.colors, SeedOutcome::Inserted(colors.len()));
        assert_eq!(report.dev.users, SeedOutcome::Inserted(2));
        assert!(repo.get_user_by_username("carol").await.unwrap().is_none());
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[test]
    fn test_confirm_reset_accepts_yes_only() {
        for (answer, expected) in [
            ("yes\n", true),
            ("YES\n", true),
            ("  yes  \n", true),
            ("y\n", false),
            ("no\n", false),
            ("", false),
        ] {
            let mut out = Vec::new();
            let confirmed = confirm_reset(Cursor::new(answer), &mut out).unwrap();
            assert_eq!(confirmed, expected, "answer {:?}", answer);
            assert_eq!(String::from_utf8(out).unwrap(), RESET_PROMPT);
        }
    }
}
