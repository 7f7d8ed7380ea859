//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Bank account number encryption.
    pub cipher: CipherConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency code used when an operation does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Attempts the identifier allocator makes before giving up.
    #[serde(default = "default_utr_max_attempts")]
    pub utr_max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            utr_max_attempts: default_utr_max_attempts(),
        }
    }
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_utr_max_attempts() -> u32 {
    8
}

/// Field cipher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CipherConfig {
    /// Base64url-encoded 256-bit key.
    pub key: String,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERLOOP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
