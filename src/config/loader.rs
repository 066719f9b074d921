//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `listener.port`.
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding `upstream.url`.
pub const ENV_ANKI_CONNECT_URL: &str = "ANKI_CONNECT_URL";
/// Environment variable overriding `mining.post_mine_action`.
pub const ENV_POST_MINE_ACTION: &str = "POST_MINE_ACTION";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value, reason } => {
                write!(f, "Invalid {}='{}': {}", key, value, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BridgeConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration the way the binary does: optional file, then process
/// environment overrides, then validation.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => BridgeConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides looked up through `lookup`.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_PORT) {
        config.listener.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                key: ENV_PORT,
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(value) = lookup(ENV_ANKI_CONNECT_URL) {
        config.upstream.url = value.trim().to_string();
    }

    if let Some(value) = lookup(ENV_POST_MINE_ACTION) {
        config.mining.post_mine_action = value.parse().map_err(|reason| ConfigError::Env {
            key: ENV_POST_MINE_ACTION,
            value: value.clone(),
            reason,
        })?;
    }

    Ok(())
}
