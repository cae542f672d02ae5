//! Configuration loader with layered sources
//!
//! Loads settings from multiple sources with the following precedence
//! (highest to lowest):
//! 1. `SVN_AUTHZ_FILE`
//! 2. Environment variables (SVN_AUTHZ__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "svn-authz.toml",
    ".svn-authz.toml",
    "~/.config/svn-authz/config.toml",
    "/etc/svn-authz/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. SVN_AUTHZ__AUTHZ__MATCH_MODE=regex, SVN_AUTHZ__LOGGING__LEVEL=debug
    builder = builder.add_source(
        Environment::with_prefix("SVN_AUTHZ")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(file) = std::env::var("SVN_AUTHZ_FILE") {
        builder = builder
            .set_override("authz.file", file)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(file) = &config.authz.file
        && file.trim().is_empty()
    {
        return Err(ConfigError::Invalid {
            message: "authz.file must not be empty".to_string(),
        });
    }

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Invalid {
            message: "logging.level must not be empty".to_string(),
        });
    }

    Ok(())
}
