//! # Shop Configuration
//!
//! Settings for the storefront services.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFRONT_DB_PATH=/var/lib/shopfront/shop.db                       │
//! │     SHOPFRONT_DB_MAX_CONNECTIONS=8                                     │
//! │     SHOPFRONT_LOG=debug                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopfront/shopfront.toml (Linux)                         │
//! │     ~/Library/Application Support/com.shopfront.shopfront/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "shopfront.db"
//! max_connections = 5
//!
//! [cart]
//! max_items = 100
//! max_item_quantity = 999
//!
//! [logging]
//! filter = "info,shopfront=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use shopfront_core::{CartLimits, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};
use shopfront_db::DbConfig;

/// Errors raised while loading or saving [`ShopConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("shopfront.db"),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartSettings {
    /// Distinct products per cart.
    pub max_items: usize,
    /// Units of one product per cart.
    pub max_item_quantity: i64,
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            max_items: MAX_CART_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: "info,shopfront=debug,sqlx=warn".to_string(),
        }
    }
}

// =============================================================================
// Shop Config
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub database: DatabaseSettings,
    pub cart: CartSettings,
    pub logging: LoggingSettings,
}

impl ShopConfig {
    /// Loads configuration: defaults, then the file, then the environment.
    ///
    /// A missing file is not an error. A malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shop config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Shop config saved");
        Ok(())
    }

    /// Rejects settings the services cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.cart.max_items == 0 {
            return Err(ConfigError::Invalid("cart.max_items must be greater than 0".into()));
        }
        if self.cart.max_item_quantity <= 0 {
            return Err(ConfigError::Invalid(
                "cart.max_item_quantity must be greater than 0".into(),
            ));
        }
        self.cart_limits()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("cart: {}", e)))?;

        Ok(())
    }

    /// Applies `SHOPFRONT_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("SHOPFRONT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("SHOPFRONT_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid SHOPFRONT_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = var("SHOPFRONT_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfront", "shopfront")
            .map(|dirs| dirs.config_dir().join("shopfront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn cart_limits(&self) -> CartLimits {
        CartLimits {
            max_items: self.cart.max_items,
            max_item_quantity: self.cart.max_item_quantity,
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
