//! KSurplus CLI - Database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! ks-cli migrate
//!
//! # Load demo products (opening stock goes through the ledger)
//! ks-cli seed --file crates/cli/seed/products.yaml
//! ```
//!
//! Both commands read `KSURPLUS_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ks-cli")]
#[command(author, version, about = "KSurplus CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalogue with demo products
    Seed {
        /// YAML file listing the products to create
        #[arg(short, long, default_value = "crates/cli/seed/products.yaml")]
        file: String,

        /// Create products even if an active product has the same name
        #[arg(long)]
        allow_duplicates: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            file,
            allow_duplicates,
        } => commands::seed::products(&file, allow_duplicates).await?,
    }
    Ok(())
}
