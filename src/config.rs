//! Runtime configuration loaded from the environment.
//!
//! A `.env` file is picked up by `dotenvy` in `main` before this runs.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use crate::pricing::calculators::check_margin;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    /// Margin applied to quotes when neither the request nor a partner sets one
    pub default_margin_percent: Decimal,
    pub default_currency: String,
    pub rate_cache_ttl: Duration,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "10")?,
            default_margin_percent: try_load("DEFAULT_MARGIN_PERCENT", "15")?,
            default_currency: try_load("DEFAULT_CURRENCY", "EUR")?,
            rate_cache_ttl: Duration::from_secs(try_load("RATE_CACHE_TTL_SECS", "600")?),
            run_migrations: try_load("RUN_MIGRATIONS", "true")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every request fail later
    pub fn validate(&self) -> Result<()> {
        check_margin(self.default_margin_percent).context("Invalid DEFAULT_MARGIN_PERCENT")?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: "0.0.0.0:3000".to_string(),
            database_max_connections: 10,
            default_margin_percent: Decimal::from(15),
            default_currency: "EUR".to_string(),
            rate_cache_ttl: Duration::from_secs(600),
            run_migrations: true,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_to_default() {
        let value: u32 = try_load("TRAVEL_DESK_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_try_load_rejects_garbage() {
        let result: Result<u32> = try_load("TRAVEL_DESK_TEST_UNSET_VARIABLE_2", "not-a-number");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_default_margin_out_of_range() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            default_margin_percent: Decimal::from(-5),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_margin_percent: Decimal::from(1000),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DEFAULT_MARGIN_PERCENT"));
    }

    #[test]
    fn test_default_margin_parses_as_decimal() {
        let margin: Decimal = try_load("TRAVEL_DESK_TEST_UNSET_MARGIN", "12.5").unwrap();
        assert_eq!(margin, Decimal::new(125, 1));
    }
}
