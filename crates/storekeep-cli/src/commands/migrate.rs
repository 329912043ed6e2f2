//! Schema migration command

use storekeep_engine::ServiceConfig;
use storekeep_store::{db, migrations};

pub fn execute(config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db::open(&config.database.path)?;
    db::configure(&conn, config.database.busy_timeout())?;
    migrations::apply_migrations(&mut conn)?;

    let applied = migrations::applied_migrations(&conn)?;
    println!("Database: {}", config.database.path.display());
    for id in applied {
        println!("  applied: {}", id);
    }
    Ok(())
}
