//! Configuration types for svn-authz
//!
//! This module defines the settings structure that can be loaded from
//! TOML files and/or environment variables.

use crate::authz::MatchMode;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Authz source settings
    pub authz: AuthzFileConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where the authz source lives and how its route keys match
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthzFileConfig {
    /// Path of the authz file (`~` is expanded)
    pub file: Option<String>,

    /// Route key comparison
    pub match_mode: MatchMode,
}

impl AuthzFileConfig {
    /// Configured file path with a leading `~` expanded
    pub fn expanded_file(&self) -> Option<String> {
        self.file
            .as_deref()
            .map(|path| shellexpand::tilde(path).into_owned())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
