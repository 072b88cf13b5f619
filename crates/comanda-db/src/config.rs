//! Configuration loading.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.

use std::env;
use std::time::Duration;

use comanda_core::policy::DEFAULT_TAKEAWAY_ORIGIN;
use comanda_core::{MissingIngredientPolicy, OversellPolicy, StorePolicy};

use crate::pool::DbConfig;

/// Database and store policy settings for one deployment.
#[derive(Debug, Clone)]
pub struct ComandaConfig {
    pub db: DbConfig,
    pub policy: StorePolicy,
}

impl ComandaConfig {
    /// Load configuration from environment variables.
    ///
    /// ```text
    /// COMANDA_DB_PATH              ./comanda.db
    /// COMANDA_DB_MAX_CONNECTIONS   5
    /// COMANDA_OVERSELL             allow | reject
    /// COMANDA_MISSING_INGREDIENT   skip | abort
    /// COMANDA_TAKEAWAY_ORIGIN      TAKEAWAY
    /// COMANDA_LOCK_TIMEOUT_SECS    10
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ComandaConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup("COMANDA_DB_PATH").unwrap_or_else(|| "./comanda.db".to_string());

        let max_connections: u32 = lookup("COMANDA_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMANDA_DB_MAX_CONNECTIONS".to_string()))?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "COMANDA_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        let oversell: OversellPolicy = lookup("COMANDA_OVERSELL")
            .unwrap_or_else(|| "allow".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMANDA_OVERSELL".to_string()))?;

        let missing_ingredient: MissingIngredientPolicy = lookup("COMANDA_MISSING_INGREDIENT")
            .unwrap_or_else(|| "skip".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMANDA_MISSING_INGREDIENT".to_string()))?;

        let takeaway_origin = lookup("COMANDA_TAKEAWAY_ORIGIN")
            .unwrap_or_else(|| DEFAULT_TAKEAWAY_ORIGIN.to_string());
        if takeaway_origin.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "COMANDA_TAKEAWAY_ORIGIN".to_string(),
            ));
        }

        let lock_timeout_secs: u64 = lookup("COMANDA_LOCK_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMANDA_LOCK_TIMEOUT_SECS".to_string()))?;

        Ok(ComandaConfig {
            db: DbConfig::new(path).max_connections(max_connections),
            policy: StorePolicy::default()
                .with_oversell(oversell)
                .with_missing_ingredient(missing_ingredient)
                .with_takeaway_origin(takeaway_origin.trim())
                .with_lock_timeout(Duration::from_secs(lock_timeout_secs)),
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ComandaConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db.max_connections, 5);
        assert_eq!(config.policy, StorePolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = ComandaConfig::from_lookup(lookup(&[
            ("COMANDA_DB_PATH", "/tmp/x.db"),
            ("COMANDA_OVERSELL", "reject"),
            ("COMANDA_MISSING_INGREDIENT", "abort"),
            ("COMANDA_TAKEAWAY_ORIGIN", "PICKUP"),
            ("COMANDA_LOCK_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.db.database_path.to_str(), Some("/tmp/x.db"));
        assert_eq!(config.policy.oversell, OversellPolicy::Reject);
        assert_eq!(config.policy.missing_ingredient, MissingIngredientPolicy::Abort);
        assert!(config.policy.is_takeaway("PICKUP"));
        assert_eq!(config.policy.lock_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values() {
        let err = ComandaConfig::from_lookup(lookup(&[("COMANDA_OVERSELL", "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(v) if v == "COMANDA_OVERSELL"));

        assert!(ComandaConfig::from_lookup(lookup(&[("COMANDA_DB_MAX_CONNECTIONS", "0")])).is_err());
        assert!(ComandaConfig::from_lookup(lookup(&[("COMANDA_LOCK_TIMEOUT_SECS", "-1")])).is_err());
    }
}
