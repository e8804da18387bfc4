//! Configuration module for expense-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::claims::recipient::DEFAULT_DEBOUNCE;
use crate::models::SystemSettings;

#[derive(Debug, Clone)]
pub struct ExpenseConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub claims: ClaimsConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ClaimsConfig {
    /// Used when the store holds no system settings row.
    pub transport_number_length: usize,
    pub recipient_lookup_debounce: Duration,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            transport_number_length: SystemSettings::default().transport_number_length,
            recipient_lookup_debounce: DEFAULT_DEBOUNCE,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

impl ExpenseConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let defaults = ClaimsConfig::default();

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "expense-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS").unwrap_or(2),
            },
            claims: ClaimsConfig {
                transport_number_length: parse_var("TRANSPORT_NUMBER_LENGTH")
                    .filter(|len: &usize| *len > 0)
                    .unwrap_or(defaults.transport_number_length),
                recipient_lookup_debounce: parse_var("RECIPIENT_LOOKUP_DEBOUNCE_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.recipient_lookup_debounce),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_defaults() {
        let claims = ClaimsConfig::default();
        assert_eq!(claims.transport_number_length, 8);
        assert_eq!(claims.recipient_lookup_debounce, Duration::from_millis(500));
    }
}
