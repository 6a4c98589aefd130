//! Configuration loading from environment.

use std::env;

pub const DEFAULT_DATABASE: &str = "wallet.db";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime configuration. Command-line flags take precedence over these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file holding the wallet between runs
    pub database_path: String,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `WALLET_DATABASE` and `WALLET_LOG`,
    /// reading a `.env` file first if one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_path: lookup("WALLET_DATABASE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_path),
            log_filter: lookup("WALLET_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }

    pub fn with_database(mut self, database_path: Option<String>) -> Self {
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }
}
