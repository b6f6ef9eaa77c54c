//! Writes a deterministic demo data set into the dashboard database.
//!
//! Run with: `cargo run --bin dashboard-seed [DAYS] [USERS]`

use chrono::{Duration, Utc};
use dashboard::demo::demo_tables;
use dashboard::telemetry::init_tracing;
use dashboard::{SourceConfig, SqliteDataSource};

fn arg_or(index: usize, default: u32) -> Result<u32, Box<dyn std::error::Error>> {
    match std::env::args().nth(index) {
        Some(value) => Ok(value.parse()?),
        None => Ok(default),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let days = arg_or(1, 60)?;
    let users = arg_or(2, 200)?;
    let config = SourceConfig::from_env()?;

    println!("Creating demo data in {}...", config.database_path);

    let mut source = SqliteDataSource::create(&config)?;
    source.clear()?;

    let start = Utc::now().date_naive() - Duration::days(i64::from(days));
    let tables = demo_tables(start, days, users);
    source.insert_batch(&tables.facts, &tables.dims)?;

    println!("  {}: {} activity rows", config.fact_table, tables.facts.len());
    println!("  {}: {} user rows", config.dim_table, tables.dims.len());
    println!();
    println!("Done. Start the dashboard with: cargo run --bin dashboard-server");

    Ok(())
}
