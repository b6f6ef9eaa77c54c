//! Environment-driven configuration.
//!
//! Binaries call `dotenvy::dotenv()` first, so every variable below can also
//! be set in a `.env` file next to the working directory.

use std::fmt;

pub const DEFAULT_DATABASE_PATH: &str = "analytics.db";
pub const DEFAULT_FACT_TABLE: &str = "fact_user_activity";
pub const DEFAULT_DIM_TABLE: &str = "dim_users";

/// Where the dashboard reads its two tables from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Path to SQLite database
    pub database_path: String,
    /// Activity fact table name
    pub fact_table: String,
    /// User dimension table name
    pub dim_table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            fact_table: DEFAULT_FACT_TABLE.to_string(),
            dim_table: DEFAULT_DIM_TABLE.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        SourceConfig {
            database_path: database_path.into(),
            ..SourceConfig::default()
        }
    }

    /// Reads `DATABASE_PATH`, `FACT_TABLE` and `DIM_TABLE`, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = SourceConfig {
            database_path: env_or("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            fact_table: env_or("FACT_TABLE", DEFAULT_FACT_TABLE),
            dim_table: env_or("DIM_TABLE", DEFAULT_DIM_TABLE),
        };
        config.validate()?;
        Ok(config)
    }

    /// Table names are spliced into SQL, so only plain identifiers are allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, name) in [("FACT_TABLE", &self.fact_table), ("DIM_TABLE", &self.dim_table)] {
            if !is_sql_identifier(name) {
                return Err(ConfigError::Invalid {
                    var,
                    value: name.clone(),
                    reason: "expected letters, digits and underscores".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { var, value, reason } => {
                write!(f, "Invalid {}='{}': {}", var, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
