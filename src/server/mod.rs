//! REST API server for the callback-driven dashboard

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, SharedSource};

use crate::config::{env_or, ConfigError, SourceConfig};
use crate::source::UnavailableDataSource;
use crate::sqlite_source::SqliteDataSource;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 8050)
    pub port: u16,
    /// Where the dashboard tables live
    pub source: SourceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8050,
            source: SourceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, source: SourceConfig) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            source,
        }
    }

    /// Reads `HOST` and `PORT` plus the [`SourceConfig`] variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let port_var = env_or("PORT", &defaults.port.to_string());
        let port = port_var.parse::<u16>().map_err(|e| ConfigError::Invalid {
            var: "PORT",
            value: port_var.clone(),
            reason: e.to_string(),
        })?;

        Ok(ServerConfig {
            host: env_or("HOST", &defaults.host),
            port,
            source: SourceConfig::from_env()?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Runs the API server
///
/// Loads the first snapshot before binding, so the dashboard has data (or an
/// explicit empty state) from the first request on. A database that cannot be
/// opened is logged and served as "no data".
///
/// # Example
/// ```rust,no_run
/// use dashboard::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = match SqliteDataSource::open(&config.source) {
        Ok(source) => AppState::new(source),
        Err(e) => {
            tracing::error!("Error opening {}: {}", config.source.database_path, e);
            AppState::new(UnavailableDataSource::new(e.to_string()))
        }
    };
    let state = Arc::new(state);

    let app = routes::create_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_localhost() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:8050");
        assert_eq!(config.source.database_path, "analytics.db");
    }
}
