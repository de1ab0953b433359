//! Configuration module for pricing-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub catalog_service: CollaboratorSettings,
    pub inventory_service: CollaboratorSettings,
    pub usage_service: CollaboratorSettings,
    /// Currency assumed for price plans that carry no unit.
    pub default_currency: String,
}

#[derive(Debug, Clone)]
pub struct CollaboratorSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl PricingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_vars(common, |key| env::var(key).ok())
    }

    /// Build from `common` plus a variable lookup.
    pub fn from_vars<F>(common: core_config::Config, var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "HTTP_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    raw
                ))
            })?,
            None => common.http_timeout_secs,
        };

        let default_currency = var("DEFAULT_CURRENCY")
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "EUR".to_string());
        if default_currency.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DEFAULT_CURRENCY must not be empty"
            )));
        }

        let collaborator = |key: &str, fallback: &str| CollaboratorSettings {
            url: var(key).unwrap_or_else(|| fallback.to_string()),
            timeout_secs,
        };

        Ok(Self {
            service_name: var("SERVICE_NAME").unwrap_or_else(|| "pricing-service".to_string()),
            service_version: var("SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otlp_endpoint: var("OTLP_ENDPOINT").filter(|e| !e.trim().is_empty()),
            catalog_service: collaborator(
                "CATALOG_SERVICE_URL",
                "http://catalog-service:3001/tmf-api/productCatalogManagement/v4",
            ),
            inventory_service: collaborator(
                "INVENTORY_SERVICE_URL",
                "http://inventory-service:3001/tmf-api/productInventory/v4",
            ),
            usage_service: collaborator(
                "USAGE_SERVICE_URL",
                "http://usage-service:3001/tmf-api/usageManagement/v4",
            ),
            default_currency,
            common,
        })
    }
}
