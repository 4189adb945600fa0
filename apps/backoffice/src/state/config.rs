//! # Configuration
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`CAISSE_*`)
//! 3. Defaults (this file)
//!
//! Configuration is read-only after startup.

use std::path::PathBuf;
use std::time::Duration;

use caisse_core::variance::VariancePolicy;
use caisse_core::{Money, CASH_METHOD_CODE};
use caisse_db::service::{DEFAULT_LIST_LIMIT, DEFAULT_STORE_TIMEOUT};
use caisse_db::ServiceConfig;
use serde::Serialize;

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Bound on every store call, in milliseconds.
    pub store_timeout_ms: u64,

    /// Payment method code counted as cash.
    pub cash_method_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Default page size of `list`.
    pub list_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            max_connections: 5,
            store_timeout_ms: u64::try_from(DEFAULT_STORE_TIMEOUT.as_millis()).unwrap_or(5_000),
            cash_method_code: CASH_METHOD_CODE.to_string(),
            currency_symbol: "€".to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// ## Environment Variables
    /// - `CAISSE_DB_PATH`: SQLite file (`:memory:` for a throwaway database)
    /// - `CAISSE_MAX_CONNECTIONS`: pool size
    /// - `CAISSE_STORE_TIMEOUT_MS`: store call timeout
    /// - `CAISSE_CASH_METHOD_CODE`: payment method code counted as cash
    /// - `CAISSE_CURRENCY_SYMBOL`: display symbol
    /// - `CAISSE_LIST_LIMIT`: default page size
    pub fn from_env() -> Result<Self, ConfigError> {
        AppConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = lookup("CAISSE_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("CAISSE_MAX_CONNECTIONS") {
            config.max_connections = parse_positive("CAISSE_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = lookup("CAISSE_STORE_TIMEOUT_MS") {
            config.store_timeout_ms = parse_positive("CAISSE_STORE_TIMEOUT_MS", &value)?;
        }

        if let Some(code) = lookup("CAISSE_CASH_METHOD_CODE") {
            let code = code.trim();
            if code.is_empty() {
                return Err(ConfigError::InvalidValue("CAISSE_CASH_METHOD_CODE".to_string()));
            }
            config.cash_method_code = code.to_string();
        }

        if let Some(symbol) = lookup("CAISSE_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(value) = lookup("CAISSE_LIST_LIMIT") {
            config.list_limit = parse_positive("CAISSE_LIST_LIMIT", &value)?;
        }

        Ok(config)
    }

    /// Service configuration derived from this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default()
            .store_timeout(Duration::from_millis(self.store_timeout_ms))
            .variance_policy(VariancePolicy::default().with_cash_method_code(&self.cash_method_code))
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(-150), "-1.50 €");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        format!(
            "{} {}",
            Money::from_cents(cents).to_decimal_string(),
            self.currency_symbol
        )
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine the application data directory")]
    NoDataDirectory,

    #[error("Could not create data directory {path}: {message}")]
    DataDirectory { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_timeout_ms, 5_000);
        assert_eq!(config.cash_method_code, "CASH");
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CAISSE_DB_PATH", "/tmp/caisse.db"),
            ("CAISSE_STORE_TIMEOUT_MS", "250"),
            ("CAISSE_CASH_METHOD_CODE", "ESP"),
            ("CAISSE_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/caisse.db")));
        assert_eq!(config.max_connections, 2);

        let service = config.service_config();
        assert_eq!(service.store_timeout, Duration::from_millis(250));
        assert_eq!(service.variance_policy.cash_method_code, "ESP");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("CAISSE_STORE_TIMEOUT_MS", "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("CAISSE_STORE_TIMEOUT_MS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("CAISSE_MAX_CONNECTIONS", "-1")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("CAISSE_CASH_METHOD_CODE", " ")])).is_err());
    }

    #[test]
    fn test_format_currency() {
        let config = AppConfig::default();
        assert_eq!(config.format_currency(11650), "116.50 €");
        assert_eq!(config.format_currency(5), "0.05 €");
        assert_eq!(config.format_currency(0), "0.00 €");
        assert_eq!(config.format_currency(-150), "-1.50 €");
        assert_eq!(config.format_currency(-20750), "-207.50 €");
    }

    #[test]
    fn test_format_currency_agrees_with_money() {
        let config = AppConfig::from_lookup(lookup(&[("CAISSE_CURRENCY_SYMBOL", "CHF")])).unwrap();

        for cents in [-5, -99, -100, 1, 123_456_789] {
            assert_eq!(
                config.format_currency(cents),
                format!("{} CHF", Money::from_cents(cents))
            );
        }
        assert_eq!(config.format_currency(-5), "-0.05 CHF");
    }
}
