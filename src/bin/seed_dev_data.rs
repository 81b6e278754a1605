//! Create example users and sample records for local development.

use anyhow::{Context, Result};
use clap::Parser;
use cross_stitch_tracker::config::DEFAULT_DATABASE_PATH;
use cross_stitch_tracker::seed::{seed_dev_data, SeedOutcome, DEV_PASSWORD, DEV_USERS};
use cross_stitch_tracker::{init_db, init_tracing, Repository};

#[derive(Parser, Debug)]
#[command(name = "seed_dev_data")]
#[command(about = "Seed example users and sample data", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    database_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let pool = init_db(&args.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", args.database_path))?;
    let repo = Repository::new(pool);

    let report = seed_dev_data(&repo).await?;
    match report.users {
        SeedOutcome::Inserted(n) => {
            println!("Seeded {} users:", n);
            for (username, _) in DEV_USERS {
                println!("  - Username: {}, Password: {}", username, DEV_PASSWORD);
            }
        }
        SeedOutcome::Skipped { existing } => {
            println!("Users already seeded ({} users found). Skipping.", existing)
        }
    }
    if let SeedOutcome::Inserted(n) = report.samples {
        println!("Seeded {} sample records.", n);
    }
    Ok(())
}
