//! Seed data script - populates the catalog with the demo data set
//!
//! Run with: cargo run --bin seed-data [-- --reseed]
//!
//! Uses the same configuration as the server (config/*.toml, APP__* env vars).

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use catalog_api::{config, db, services::SeedService};

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate the catalog with demo data", version)]
struct Cli {
    #[arg(
        long,
        help = "Delete every catalog row before seeding instead of skipping a non-empty store"
    )]
    reseed: bool,

    #[arg(long, help = "Database URL; overrides APP__DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("Connecting to database");
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;

    let seeder = SeedService::new(Arc::new(pool));
    let report = if cli.reseed {
        seeder.reseed().await?
    } else {
        seeder.seed().await?
    };

    info!(
        seeded = report.seeded,
        categories = report.counts.categories,
        attributes = report.counts.attributes,
        attribute_values = report.counts.attribute_values,
        products = report.counts.products,
        product_attribute_values = report.counts.product_attribute_values,
        "{}",
        report.message
    );
    if !report.seeded {
        info!("Catalog already had data; run with --reseed to replace it");
    }

    Ok(())
}
