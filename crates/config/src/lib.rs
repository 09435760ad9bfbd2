use matching_engine::EngineConfig;
use serde::{Deserialize, Serialize};

pub mod parser;
pub mod validator;

pub use parser::{generate_default_config, load_config, save_config};
pub use validator::{validate_config, ValidationError, ValidationReport};

/// Top-level configuration for an exchange instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    pub exchange: ExchangeInfo,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Products registered at startup
    #[serde(default)]
    pub products: Vec<String>,
}

/// Exchange identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
}

/// Logging output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Output format: pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".to_string()
}
