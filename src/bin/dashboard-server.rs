//! Dashboard API Server Binary
//!
//! Run with: `cargo run --bin dashboard-server`

use dashboard::telemetry::init_tracing;
use dashboard::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine; variables may come from the environment.
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;

    println!("Starting Activity Dashboard Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Database: {}", config.source.database_path);
    println!(
        "   Tables: {} / {}",
        config.source.fact_table, config.source.dim_table
    );
    println!();
    println!("Dashboard will be available at: http://{}", config.addr());
    println!();
    println!("Available endpoints:");
    println!("  GET  /                  - Browser dashboard");
    println!("  GET  /health            - Health check");
    println!("  GET  /dashboard         - All figures");
    println!("  GET  /charts/:chart     - One figure (dau, countries, adoption)");
    println!("  GET  /series/:chart     - Raw series for one chart");
    println!("  GET  /snapshot          - Current snapshot info");
    println!("  POST /refresh           - Reload data from the database");
    println!();

    run_server(config).await?;

    Ok(())
}
