//! Configuration management for the Inventory POS platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with POS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Stock transaction settings
    pub stock: StockConfig,

    /// Inventory ledger query settings
    pub ledger: LedgerConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Shared secret used to verify tokens issued by the identity provider
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StockConfig {
    /// Attempts per stock operation when the store reports a serialization
    /// or lock conflict. Business rule failures are never retried.
    pub max_attempts: u32,

    /// Backoff between attempts, multiplied by the attempt number
    pub retry_backoff_ms: u64,

    /// How long a unit waits for a variant row lock before giving up
    pub lock_timeout_ms: u64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 25,
            lock_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Rows returned when the caller gives no limit
    pub default_limit: u32,

    /// Hard cap on rows per ledger query
    pub max_limit: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// "pretty" or "json"
    pub format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("POS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("stock.max_attempts", 3)?
            .set_default("stock.retry_backoff_ms", 25)?
            .set_default("stock.lock_timeout_ms", 5_000)?
            .set_default("ledger.default_limit", 100)?
            .set_default("ledger.max_limit", 1000)?
            .set_default("logging.format", "pretty")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (POS_ prefix)
            .add_source(
                Environment::with_prefix("POS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_defaults_retry_a_few_times() {
        let stock = StockConfig::default();
        assert_eq!(stock.max_attempts, 3);
        assert!(stock.retry_backoff_ms > 0);
        assert_eq!(stock.lock_timeout_ms, 5_000);
    }

    #[test]
    fn test_ledger_default_is_within_cap() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.default_limit, 100);
        assert!(ledger.default_limit <= ledger.max_limit);
    }
}
