//! Route prefix matching
//!
//! A route key matches a queried path when the path begins with it. Keys are
//! compared literally by default; `MatchMode::Regex` compiles each key as an
//! anchored regular expression for compatibility with legacy fixtures whose
//! keys rely on pattern syntax.

use crate::error::{AuthzError, AuthzResult};
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// How route keys are compared against queried paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain string prefix
    #[default]
    Literal,
    /// Key is a regular expression anchored at the start of the path
    Regex,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Literal => write!(f, "literal"),
            MatchMode::Regex => write!(f, "regex"),
        }
    }
}

/// Compiled prefix matcher for a single route key
#[derive(Debug, Clone)]
pub enum PrefixMatcher {
    Literal(String),
    Regex(Regex),
}

impl PrefixMatcher {
    pub fn new(key: &str, mode: MatchMode) -> AuthzResult<Self> {
        match mode {
            MatchMode::Literal => Ok(Self::Literal(key.to_string())),
            MatchMode::Regex => {
                let regex = Regex::new(&format!("^(?:{})", key)).map_err(|e| {
                    AuthzError::InvalidPattern {
                        pattern: key.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self::Regex(regex))
            }
        }
    }

    /// Check whether `text` begins with this key
    pub fn matches(&self, text: &str) -> bool {
        match self {
            PrefixMatcher::Literal(prefix) => text.starts_with(prefix.as_str()),
            PrefixMatcher::Regex(regex) => regex.is_match(text),
        }
    }
}
