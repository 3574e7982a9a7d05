//! Configuration management for the GebeyaNet inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with GEBEYA__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Fallback signing secret for local development
pub const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which store backs the services
    pub store: StoreConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Inventory engine tuning
    pub inventory: InventoryConfig,
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

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// HS256 secret shared with the token issuer
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// How long a transaction waits for a row lock before giving up
    pub lock_timeout_ms: u64,

    /// Maximum alerts returned by the alerts endpoint
    pub alert_limit: usize,

    /// Look-ahead window for the "expiring" item filter
    pub expiring_window_days: i64,

    /// Movements attached to a single-item read
    pub recent_movements_limit: i64,

    pub recommendation_limit: usize,

    pub top_items_limit: usize,
}

impl InventoryConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
            alert_limit: 50,
            expiring_window_days: 7,
            recent_movements_limit: 10,
            recommendation_limit: 5,
            top_items_limit: 5,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("GEBEYA_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let inventory = InventoryConfig::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/gebeya")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", environment == "development")?
            .set_default("store.backend", "postgres")?
            .set_default("jwt.secret", DEVELOPMENT_JWT_SECRET)?
            .set_default("inventory.lock_timeout_ms", inventory.lock_timeout_ms)?
            .set_default("inventory.alert_limit", inventory.alert_limit as u64)?
            .set_default("inventory.expiring_window_days", inventory.expiring_window_days)?
            .set_default(
                "inventory.recent_movements_limit",
                inventory.recent_movements_limit,
            )?
            .set_default(
                "inventory.recommendation_limit",
                inventory.recommendation_limit as u64,
            )?
            .set_default("inventory.top_items_limit", inventory.top_items_limit as u64)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GEBEYA__ prefix)
            .add_source(
                Environment::with_prefix("GEBEYA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that are only acceptable on a developer machine
    pub fn check(&self) -> AppResult<()> {
        if self.environment == "production" && self.jwt.secret == DEVELOPMENT_JWT_SECRET {
            return Err(AppError::Configuration(
                "jwt.secret must be set in production".to_string(),
            ));
        }
        if self.inventory.lock_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "inventory.lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}
