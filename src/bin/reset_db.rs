//! Drop every table, recreate the schema and reseed.

use anyhow::{Context, Result};
use clap::Parser;
use cross_stitch_tracker::config::DEFAULT_DATABASE_PATH;
use cross_stitch_tracker::seed::{confirm_reset, load_catalog, reset_database, SeedOutcome};
use cross_stitch_tracker::{init_db, init_tracing, Repository};
use std::io;

#[derive(Parser, Debug)]
#[command(name = "reset_db")]
#[command(about = "Delete all data, recreate the schema and reseed", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    database_path: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if !args.force {
        let confirmed = confirm_reset(io::stdin().lock(), io::stdout())
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let colors = load_catalog(None).context("Failed to load color catalog")?;
    let pool = init_db(&args.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", args.database_path))?;
    let repo = Repository::new(pool);

    let report = reset_database(&repo, &colors).await?;
    println!("Database reset.");
    if let SeedOutcome::Inserted(n) = report.colors {
        println!("  - {} DMC colors", n);
    }
    if let SeedOutcome::Inserted(n) = report.dev.users {
        println!("  - {} users", n);
    }
    Ok(())
}
