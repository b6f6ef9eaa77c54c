//! Script-style front end: load once, write every chart as CSV, exit.
//!
//! Run with: `cargo run --bin dashboard-report [OUTPUT.csv]`
//! Without an argument the report goes to stdout.

use dashboard::render::{CsvReportRenderer, Renderer, DASHBOARD_TITLE};
use dashboard::telemetry::init_tracing;
use dashboard::{Snapshot, SourceConfig, SqliteDataSource};
use std::fs::File;
use std::io::{self, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SourceConfig::from_env()?;
    let snapshot = match SqliteDataSource::open(&config) {
        Ok(source) => Snapshot::refresh(&source),
        Err(e) => {
            tracing::error!("Error opening {}: {}", config.database_path, e);
            Snapshot::empty()
        }
    };

    let output: Box<dyn Write> = match std::env::args().nth(1) {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };

    let mut renderer = CsvReportRenderer::new(output);
    let counts = renderer.render_all(&snapshot.view())?;
    renderer.into_inner()?.flush()?;

    tracing::info!(
        title = DASHBOARD_TITLE,
        records = snapshot.records().len(),
        rows = counts.iter().sum::<usize>(),
        "report written"
    );

    Ok(())
}
