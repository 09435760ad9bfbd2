use crate::ExchangeConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load and parse a YAML configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExchangeConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    debug!("Config file content length: {} bytes", content.len());

    let config: ExchangeConfig =
        serde_yaml::from_str(&content).with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Serialize a configuration back to a YAML file
pub fn save_config<P: AsRef<Path>>(config: &ExchangeConfig, path: P) -> Result<()> {
    let content = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content)
        .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
    Ok(())
}

/// A ready-to-edit configuration with sensible defaults
pub fn generate_default_config() -> ExchangeConfig {
    use crate::{ExchangeInfo, LoggingConfig};
    use matching_engine::EngineConfig;

    ExchangeConfig {
        exchange: ExchangeInfo {
            name: "Equex".to_string(),
            description: "Equity limit-order-book exchange".to_string(),
            version: "0.1.0".to_string(),
        },
        logging: LoggingConfig::default(),
        engine: EngineConfig::default(),
        products: vec!["IBM".to_string(), "GOOG".to_string()],
    }
}
