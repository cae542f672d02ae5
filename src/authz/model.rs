//! Policy model
//!
//! Classifies parsed sections into the alias table, the group table and the
//! path scopes, and orders the scopes from most to least specific.

use crate::authz::parser::{Section, Sections};
use crate::authz::patterns::{MatchMode, PrefixMatcher};
use crate::error::AuthzResult;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const ALIASES_SECTION: &str = "aliases";
pub const GROUPS_SECTION: &str = "groups";

/// Path scope key split into its repository and path components
///
/// A key without a repository carries an empty repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    pub repository: String,
    pub path: String,
}

impl RouteKey {
    pub fn parse(key: &str) -> Self {
        match key.split_once(':') {
            Some((repository, path)) => Self {
                repository: repository.to_string(),
                path: path.to_string(),
            },
            None => Self {
                repository: String::new(),
                path: key.to_string(),
            },
        }
    }

    /// Specificity order: path first, then repository, both descending.
    ///
    /// A string sorts before any of its proper prefixes, so deeper paths come
    /// first and a bare path follows the same path with a repository.
    pub fn specificity(&self, other: &Self) -> Ordering {
        other
            .path
            .cmp(&self.path)
            .then_with(|| other.repository.cmp(&self.repository))
    }
}

/// One entry of the route list
#[derive(Debug, Clone)]
pub struct Route {
    key: String,
    parsed: RouteKey,
    matcher: PrefixMatcher,
}

impl Route {
    fn new(key: String, mode: MatchMode) -> AuthzResult<Self> {
        let matcher = PrefixMatcher::new(&key, mode)?;
        Ok(Self {
            parsed: RouteKey::parse(&key),
            key,
            matcher,
        })
    }

    /// Section name this route was built from
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn repository(&self) -> &str {
        &self.parsed.repository
    }

    pub fn path(&self) -> &str {
        &self.parsed.path
    }

    /// Whether the full query or its directory part begins with this key
    pub fn applies_to(&self, full: &str, dir: Option<&str>) -> bool {
        self.matcher.matches(full) || dir.is_some_and(|d| self.matcher.matches(d))
    }
}

/// Classified, immutable view of an authz source
#[derive(Debug, Clone, Default)]
pub struct PolicyModel {
    aliases: HashMap<String, String>,
    groups: HashMap<String, Vec<String>>,
    scopes: HashMap<String, Section>,
    routes: Vec<Route>,
}

impl PolicyModel {
    pub fn from_sections(mut sections: Sections, mode: MatchMode) -> AuthzResult<Self> {
        let aliases: HashMap<String, String> = sections
            .take(ALIASES_SECTION)
            .map(|s| {
                s.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let groups: HashMap<String, Vec<String>> = sections
            .take(GROUPS_SECTION)
            .map(|s| {
                s.iter()
                    .map(|(name, members)| (name.to_string(), split_members(members)))
                    .collect()
            })
            .unwrap_or_default();

        let mut routes = Vec::with_capacity(sections.len());
        let mut scopes = HashMap::with_capacity(sections.len());
        for (name, section) in sections {
            routes.push(Route::new(name.clone(), mode)?);
            scopes.insert(name, section);
        }
        routes.sort_by(|a, b| a.parsed.specificity(&b.parsed));

        debug!(
            aliases = aliases.len(),
            groups = groups.len(),
            scopes = scopes.len(),
            match_mode = %mode,
            "Loaded authz policy model"
        );

        Ok(Self {
            aliases,
            groups,
            scopes,
            routes,
        })
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn scope(&self, key: &str) -> Option<&Section> {
        self.scopes.get(key)
    }

    /// Path scopes, most specific first
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Split a raw comma-separated member list, dropping empty entries
fn split_members(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
