//! Load the DMC color catalog into the floss color table.

use anyhow::{Context, Result};
use clap::Parser;
use cross_stitch_tracker::config::DEFAULT_DATABASE_PATH;
use cross_stitch_tracker::seed::{load_catalog, seed_dmc_colors, SeedOutcome};
use cross_stitch_tracker::{init_db, init_tracing, Repository};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seed_floss_colors")]
#[command(about = "Seed the floss color table with DMC colors", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    database_path: String,

    /// JSON catalog to load instead of the bundled one
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let colors = load_catalog(args.file.as_deref()).context("Failed to load color catalog")?;
    let pool = init_db(&args.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", args.database_path))?;
    let repo = Repository::new(pool);

    match seed_dmc_colors(&repo, &colors).await? {
        SeedOutcome::Inserted(n) => println!("Seeded {} DMC colors.", n),
        SeedOutcome::Skipped { existing } => println!(
            "DMC colors already seeded ({} colors found). Skipping.",
            existing
        ),
    }
    Ok(())
}
