//! # Invoicer Configuration
//!
//! Database and billing settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INVOICER_DB_PATH=/var/lib/invoicer/invoicer.db                     │
//! │     INVOICER_MAX_CONNECTIONS=8                                         │
//! │     INVOICER_TAX_RATE_BPS=1000                                         │
//! │     INVOICER_MALFORMED_NUMBERS=reject                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/invoicer/invoicer.toml (Linux)                           │
//! │     ~/Library/Application Support/com.invoicer.invoicer/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./invoicer.db, 5 connections, 10% tax, restart on malformed       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./invoicer.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! busy_timeout_ms = 5000
//!
//! [billing]
//! tax_rate_bps = 1000        # 10%
//! malformed_numbers = "restart"  # restart | reject
//! ```

use invoicer_core::sequence::MalformedNumberPolicy;
use invoicer_core::validation::validate_tax_rate_bps;
use invoicer_core::{BillingPolicy, TaxRate, DEFAULT_TAX_RATE_BPS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`InvoicerConfig`].
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./invoicer.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Billing Settings
// =============================================================================

/// `[billing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSettings {
    /// System-wide tax rate in basis points.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    #[serde(default)]
    pub malformed_numbers: MalformedNumberPolicy,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            tax_rate_bps: default_tax_rate_bps(),
            malformed_numbers: MalformedNumberPolicy::default(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Invoicer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoicerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub billing: BillingSettings,
}

impl InvoicerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or the platform default location)
    /// 3. Environment variables
    ///
    /// A missing file is not an error; an unreadable or invalid one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading invoicer config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        validate_tax_rate_bps(self.billing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    /// Applies environment variable overrides. Unparseable values are
    /// logged and ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("INVOICER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("INVOICER_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid INVOICER_MAX_CONNECTIONS"),
            }
        }

        if let Ok(bps) = std::env::var("INVOICER_TAX_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(n) => {
                    debug!(tax_rate_bps = n, "Overriding tax rate from environment");
                    self.billing.tax_rate_bps = n;
                }
                Err(_) => warn!(value = %bps, "Ignoring invalid INVOICER_TAX_RATE_BPS"),
            }
        }

        if let Ok(policy) = std::env::var("INVOICER_MALFORMED_NUMBERS") {
            match policy.parse::<MalformedNumberPolicy>() {
                Ok(p) => self.billing.malformed_numbers = p,
                Err(_) => warn!(value = %policy, "Ignoring invalid INVOICER_MALFORMED_NUMBERS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "invoicer", "invoicer")
            .map(|dirs| dirs.config_dir().join("invoicer.toml"))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn policy(&self) -> BillingPolicy {
        BillingPolicy::new(TaxRate::from_bps(self.billing.tax_rate_bps))
            .with_malformed_numbers(self.billing.malformed_numbers)
    }

    /// Builds the pool configuration, billing policy included.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .billing(self.policy())
    }
}
