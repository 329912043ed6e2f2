//! Storekeep CLI
//!
//! Operator entry point: schema migration, batch consumption of command
//! envelopes, and read-only inspection of stores.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storekeep_core::logging_facility;
use storekeep_engine::ServiceConfig;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "storekeep")]
#[command(about = "Storekeep - Versioned store catalog", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply embedded schema migrations
    Migrate,
    /// Process command envelopes, one JSON object per line
    Consume(commands::consume::ConsumeArgs),
    /// Print a store and its current version
    Show(commands::inspect::ShowArgs),
    /// Print the version history of a store, newest first
    History(commands::inspect::HistoryArgs),
    /// Print one version of a store
    Version(commands::inspect::VersionArgs),
}

fn main() {
    let cli = Cli::parse();

    let config = match ServiceConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    if let Ok(profile) = config.logging.profile() {
        logging_facility::init(profile);
    }

    let result = match cli.command {
        Commands::Migrate => commands::migrate::execute(&config),
        Commands::Consume(args) => commands::consume::execute(args, &config),
        Commands::Show(args) => commands::inspect::show(args, &config),
        Commands::History(args) => commands::inspect::history(args, &config),
        Commands::Version(args) => commands::inspect::version(args, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
