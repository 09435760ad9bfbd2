use crate::ExchangeConfig;
use std::collections::HashSet;
use thiserror::Error;

/// A configuration problem that prevents startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Exchange name is required")]
    MissingExchangeName,

    #[error("Invalid version format: {0}. Must be in format X.Y.Z (e.g., 1.0.0)")]
    InvalidVersionFormat(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Product symbols cannot be empty")]
    EmptyProductSymbol,

    #[error("Duplicate product symbol: {0}")]
    DuplicateProduct(String),
}

/// Outcome of validating a configuration
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns true when no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a configuration, collecting every problem found
pub fn validate_config(config: &ExchangeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.exchange.name.trim().is_empty() {
        report.errors.push(ValidationError::MissingExchangeName);
    }
    if !is_semver_like(&config.exchange.version) {
        report
            .errors
            .push(ValidationError::InvalidVersionFormat(config.exchange.version.clone()));
    }
    if !matches!(config.logging.format.as_str(), "pretty" | "json" | "compact") {
        report
            .errors
            .push(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    let mut seen = HashSet::new();
    for product in &config.products {
        if product.trim().is_empty() {
            report.errors.push(ValidationError::EmptyProductSymbol);
        } else if !seen.insert(product.clone()) {
            report
                .errors
                .push(ValidationError::DuplicateProduct(product.clone()));
        }
    }
    if config.products.is_empty() {
        report
            .warnings
            .push("No products configured; the exchange will start empty".to_string());
    }

    report
}

fn is_semver_like(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| part.parse::<u32>().is_ok())
}
