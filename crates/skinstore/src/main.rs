//! Skinstore operator CLI.
//!
//! Inspects and seeds whichever data source is configured.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing::info;

use skinstore_persistence::selector::init_data_source;

use crate::config::StoreConfig;

#[derive(Debug, Parser)]
#[command(name = "skinstore", version, about = "Skinstore data source tool")]
struct Cli {
    #[command(flatten)]
    config: StoreConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the data source and print record counts
    Status,
    /// Print every record of an entity as JSON
    List {
        /// products, categories, users, orders, reviews, comments or articles
        entity: String,
    },
    /// Add a demo catalog
    Seed,
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("skinstore={level},skinstore_persistence={level}"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.config.log_level.to_ascii_lowercase());

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let source_config = cli
        .config
        .to_data_source_config()
        .map_err(|e| anyhow::anyhow!("Invalid data source configuration: {}", e))?;
    let source = init_data_source(&source_config)?;
    info!(data_source = %source.kind(), "Data source selected");

    match cli.command {
        Command::Status => commands::status(source).await,
        Command::List { entity } => commands::list(source, &entity).await,
        Command::Seed => commands::seed(source).await,
    }
}
