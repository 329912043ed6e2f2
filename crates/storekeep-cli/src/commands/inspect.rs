//! Read-only inspection commands
//!
//! Print stores and versions as JSON on stdout.

use clap::Args;
use serde_json::json;
use storekeep_engine::{ServiceConfig, StoreService};
use storekeep_store::SqliteBackend;

const OPERATOR_LOGIN: &str = "storekeep-cli";

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub store_id: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub store_id: String,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    pub store_id: String,
    pub version_id: String,
}

fn open_service(config: &ServiceConfig) -> Result<StoreService<SqliteBackend>, Box<dyn std::error::Error>> {
    let backend = SqliteBackend::open(&config.database, config.retry)?;
    Ok(StoreService::new(backend))
}

pub fn show(args: ShowArgs, config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config)?;
    let store = service
        .get_store(&args.store_id, OPERATOR_LOGIN)?
        .ok_or_else(|| format!("store {} not found", args.store_id))?;
    let current = service.get_current_version(&args.store_id)?;

    let output = json!({ "store": store, "current_version": current });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn history(args: HistoryArgs, config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config)?;
    let history = service.get_store_history(&args.store_id, OPERATOR_LOGIN)?;

    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

pub fn version(args: VersionArgs, config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config)?;
    let version = service
        .get_store_version(&args.store_id, &args.version_id, OPERATOR_LOGIN)?
        .ok_or_else(|| {
            format!(
                "version {} not found for store {}",
                args.version_id, args.store_id
            )
        })?;

    println!("{}", serde_json::to_string_pretty(&version)?);
    Ok(())
}
