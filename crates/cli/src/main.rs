//! Mercado CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run document store migrations
//! mercado-cli migrate
//!
//! # Load products from a JSON array
//! mercado-cli seed data/seed.json
//!
//! # Seed the PostgreSQL store regardless of STOREFRONT_STORAGE
//! mercado-cli seed data/seed.json --storage postgres
//!
//! # Print product and cart counts
//! mercado-cli stats
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Create products from a JSON file, skipping taken codes
//! - `stats` - Show catalog and cart counts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "mercado-cli")]
#[command(author, version, about = "Mercado CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a JSON array of products
    Seed {
        /// Path to the JSON file
        file: PathBuf,

        /// Backend to seed (defaults to `STOREFRONT_STORAGE`)
        #[arg(short, long, value_enum)]
        storage: Option<StorageKind>,
    },
    /// Show product and cart counts
    Stats {
        /// Backend to inspect (defaults to `STOREFRONT_STORAGE`)
        #[arg(short, long, value_enum)]
        storage: Option<StorageKind>,
    },
}

/// Storage backend selectable from the command line.
#[derive(Clone, Copy, ValueEnum)]
pub enum StorageKind {
    File,
    Postgres,
}

impl StorageKind {
    /// Value understood by `STOREFRONT_STORAGE`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Postgres => "postgres",
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, storage } => {
            commands::seed::products(&file, storage).await?;
        }
        Commands::Stats { storage } => commands::stats::show(storage).await?,
    }
    Ok(())
}
