//! Checkout API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (`PAWMART_CONFIG`, default `pawmart.toml`), then environment overrides.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "pawmart.db"
//!
//! [pricing]
//! platform_fee_cents = 200
//!
//! [[pricing.regions]]
//! id = "metro"
//! base_cost_cents = 100
//! per_kg_cents = 20
//! ```

use config::{Config, File, FileFormat};
use pawmart_core::shipping::{ShippingRegion, TariffTable};
use pawmart_core::{Money, PricingEngine, DEFAULT_PLATFORM_FEE};
use pawmart_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Checkout API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,

    /// How long a request waits for a pooled connection, in milliseconds
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "pawmart.db".to_string(),
            max_connections: 5,
            busy_timeout_ms: 5000,
            acquire_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Flat fee added to every order, in cents
    pub platform_fee_cents: i64,

    /// Shipping tariff, one entry per region
    pub regions: Vec<RegionConfig>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            platform_fee_cents: DEFAULT_PLATFORM_FEE.cents(),
            regions: TariffTable::default()
                .regions()
                .map(|r| RegionConfig {
                    id: r.region_id.clone(),
                    base_cost_cents: r.base_cost.cents(),
                    per_kg_cents: r.per_kg_increment.cents(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    pub base_cost_cents: i64,
    pub per_kg_cents: i64,
}

impl CheckoutConfig {
    /// Load configuration from `PAWMART_CONFIG` (or `pawmart.toml`) and the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("PAWMART_CONFIG").unwrap_or_else(|_| "pawmart.toml".to_string());
        Self::load_from(&path, |key| env::var(key).ok())
    }

    /// Load configuration from `path` with overrides looked up through `var`.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(path: &str, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config: CheckoutConfig = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .build()?
            .try_deserialize()?;

        if let Some(port) = var("PAWMART_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAWMART_PORT".to_string()))?;
        }

        if let Some(path) = var("PAWMART_DB_PATH") {
            config.database.path = path;
        }

        if let Some(fee) = var("PAWMART_PLATFORM_FEE") {
            config.pricing.platform_fee_cents = fee
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAWMART_PLATFORM_FEE".to_string()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the pricing section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.acquire_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("database.acquire_timeout_ms".to_string()));
        }

        if self.pricing.platform_fee_cents <= 0 {
            return Err(ConfigError::InvalidValue("pricing.platform_fee_cents".to_string()));
        }

        if self.pricing.regions.is_empty() {
            return Err(ConfigError::MissingRequired("pricing.regions".to_string()));
        }

        for region in &self.pricing.regions {
            if region.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue("pricing.regions.id".to_string()));
            }
            if region.base_cost_cents < 0 || region.per_kg_cents < 0 {
                return Err(ConfigError::InvalidValue(format!("pricing.regions.{}", region.id)));
            }
        }

        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .connect_timeout(Duration::from_millis(self.database.acquire_timeout_ms))
    }

    pub fn pricing_engine(&self) -> PricingEngine {
        let tariff = TariffTable::new(self.pricing.regions.iter().map(|r| {
            ShippingRegion::new(
                r.id.clone(),
                Money::from_cents(r.base_cost_cents),
                Money::from_cents(r.per_kg_cents),
            )
        }));
        PricingEngine::new(tariff, Money::from_cents(self.pricing.platform_fee_cents))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_file_missing() {
        let config = CheckoutConfig::load_from("/nonexistent/pawmart.toml", vars(&[])).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.path, "pawmart.db");
        assert_eq!(config.pricing.platform_fee_cents, 200);
        assert_eq!(config.pricing.regions.len(), 3);

        let engine = config.pricing_engine();
        assert_eq!(engine.platform_fee(), Money::from_cents(200));
        assert!(engine.tariff().lookup("metro").is_ok());
    }

    #[test]
    fn test_file_and_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pawmart.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9000

            [database]
            busy_timeout_ms = 250
            acquire_timeout_ms = 1500

            [pricing]
            platform_fee_cents = 150

            [[pricing.regions]]
            id = "island"
            base_cost_cents = 900
            per_kg_cents = 300
            "#,
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let config = CheckoutConfig::load_from(path, vars(&[])).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.pricing.platform_fee_cents, 150);
        assert_eq!(config.pricing.regions.len(), 1);
        assert_eq!(config.pricing.regions[0].id, "island");

        let db = config.db_config();
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert_eq!(db.connect_timeout, Duration::from_millis(1500));

        let config = CheckoutConfig::load_from(
            path,
            vars(&[
                ("PAWMART_PORT", "7070"),
                ("PAWMART_DB_PATH", "/tmp/other.db"),
                ("PAWMART_PLATFORM_FEE", "99"),
            ]),
        )
        .unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.database.path, "/tmp/other.db");
        assert_eq!(config.pricing.platform_fee_cents, 99);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let missing = "/nonexistent/pawmart.toml";

        let err = CheckoutConfig::load_from(missing, vars(&[("PAWMART_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "PAWMART_PORT"));

        let err = CheckoutConfig::load_from(missing, vars(&[("PAWMART_PLATFORM_FEE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let mut config = CheckoutConfig::default();
        config.pricing.regions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        let mut config = CheckoutConfig::default();
        config.database.acquire_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = CheckoutConfig::default();
        config.pricing.regions[0].per_kg_cents = -1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }
}
