//! # Data Factory Entry Point
//!
//! One subcommand per entity type. Each run loads configuration, opens a
//! connection, generates a batch and upserts it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use data_factory::{
    config::ConfigLoader,
    db,
    generators::{CustomerFactory, TicketFactory, TicketOptions},
    seeds, telemetry,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "data-factory", about = "Seed the database with synthetic customers and tickets")]
struct Cli {
    /// Database setup file (overrides DATA_FACTORY_DB_SETUP_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    db_setup: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and upsert customers.
    Customers {
        /// Number of customers to generate.
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate and upsert the ticket history up to now.
    Tickets {
        /// Date the ticket history starts from.
        #[arg(long, default_value = "2023-02-12")]
        start: NaiveDate,

        /// Seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.db_setup {
        loader = loader.setup_path(path);
    }
    let config = loader.load().context("loading configuration")?;

    telemetry::init_tracing(&config).context("initializing telemetry")?;
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "loaded configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let command = match cli.command {
        Command::Customers { .. } => "customers",
        Command::Tickets { .. } => "tickets",
    };
    let span = telemetry::run_span(&config, command);

    async {
        match cli.command {
            Command::Customers { count, seed } => {
                let mut factory = CustomerFactory::with_rng(rng(seed));
                let written = seeds::seed_customers(&db, &mut factory, count).await?;
                println!("Upserted {} customer(s).", written);
            }
            Command::Tickets { start, seed } => {
                let options =
                    TicketOptions::starting_at(start.and_time(Default::default()).and_utc());
                let mut factory = TicketFactory::new(rng(seed), options)
                    .context("configuring ticket generator")?;
                let written = seeds::seed_tickets(&db, &mut factory, Utc::now()).await?;
                println!("Upserted {} ticket(s).", written);
            }
        }
        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    db.close().await.context("closing database connection")?;
    Ok(())
}
