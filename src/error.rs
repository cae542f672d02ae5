//! Error types for svn-authz
//!
//! This module defines the error hierarchy used throughout the crate.
//! Engine failures are configuration-integrity errors: they abort the call
//! that discovered them and are never recovered internally.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authorization error: {0}")]
    Authz(#[from] AuthzError),
}

/// Errors raised while loading or evaluating an authz policy
#[derive(Error, Debug)]
pub enum AuthzError {
    /// Malformed line in the authz source
    #[error("Syntax error at line {line}: '{content}'")]
    Syntax { line: usize, content: String },

    /// Rule string containing characters outside `r`/`w`
    #[error("Syntax error {selector}='{rule}'")]
    InvalidRule { selector: String, rule: String },

    /// Alias or group referenced but never defined
    #[error("Undefined {selector}")]
    UndefinedReference { selector: String },

    /// Group membership graph references itself
    #[error("Cycle in definition of {selector}")]
    CycleDetected { selector: String },

    /// Route key that is not a valid pattern (regex match mode only)
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    pub fn syntax(line: usize, content: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            content: content.into(),
        }
    }

    pub fn invalid_rule(selector: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::InvalidRule {
            selector: selector.into(),
            rule: rule.into(),
        }
    }

    pub fn undefined(selector: impl Into<String>) -> Self {
        Self::UndefinedReference {
            selector: selector.into(),
        }
    }

    pub fn cycle(selector: impl Into<String>) -> Self {
        Self::CycleDetected {
            selector: selector.into(),
        }
    }

    /// True for both malformed lines and malformed rule strings
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. } | Self::InvalidRule { .. })
    }
}

/// Application settings errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for engine operations
pub type AuthzResult<T> = std::result::Result<T, AuthzError>;
