//! Permission evaluation
//!
//! Walks the route list from the most to the least specific scope. The first
//! scope in which at least one rule applies to the user decides; its direct
//! and group rules are merged additively.

use crate::authz::membership::{MembershipCache, MembershipResolver, Members};
use crate::authz::model::{PolicyModel, Route};
use crate::authz::parser::{self, Section};
use crate::authz::patterns::MatchMode;
use crate::authz::rule::Access;
use crate::authz::selector::Selector;
use crate::error::{AuthzError, AuthzResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Outcome of a permission lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Granted permissions, possibly empty
    pub access: Access,
    /// Section that decided, `None` when no scope applied to the user
    pub route: Option<String>,
}

impl Decision {
    fn undecided() -> Self {
        Self {
            access: Access::NONE,
            route: None,
        }
    }
}

/// One loaded authz source: immutable tables plus their membership cache
#[derive(Debug, Default)]
pub struct Policy {
    model: PolicyModel,
    cache: MembershipCache,
}

impl Policy {
    /// Policy with no aliases, groups or scopes; grants nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a reader using literal route matching
    pub fn load<R: BufRead>(reader: R) -> AuthzResult<Self> {
        Self::load_with_mode(reader, MatchMode::Literal)
    }

    pub fn load_with_mode<R: BufRead>(reader: R, mode: MatchMode) -> AuthzResult<Self> {
        let sections = parser::parse(reader)?;
        Ok(Self {
            model: PolicyModel::from_sections(sections, mode)?,
            cache: MembershipCache::new(),
        })
    }

    /// Open and load an authz file
    pub fn from_path(path: impl AsRef<Path>, mode: MatchMode) -> AuthzResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading authz file");
        let file = File::open(path)?;
        Self::load_with_mode(BufReader::new(file), mode)
    }

    pub fn model(&self) -> &PolicyModel {
        &self.model
    }

    /// Path scopes in evaluation order
    pub fn routes(&self) -> &[Route] {
        self.model.routes()
    }

    pub fn membership(&self) -> MembershipResolver<'_> {
        MembershipResolver::new(&self.model, &self.cache)
    }

    /// Flatten a selector into concrete user names
    pub fn resolve(&self, selector: &str) -> AuthzResult<Members> {
        self.membership().resolve(selector)
    }

    /// Whether `user` (`None` for anonymous) satisfies `selector`
    pub fn includes(&self, user: Option<&str>, selector: &str) -> AuthzResult<bool> {
        self.membership().includes(user, selector)
    }

    /// Permission string for `user` on `path` (`repo:/dir` or `/dir`)
    pub fn permissions(&self, user: Option<&str>, path: &str) -> AuthzResult<String> {
        Ok(self.access(user, path)?.to_string())
    }

    pub fn access(&self, user: Option<&str>, path: &str) -> AuthzResult<Access> {
        Ok(self.decide(user, path)?.access)
    }

    /// Find the deciding scope for `user` on `path`
    pub fn decide(&self, user: Option<&str>, path: &str) -> AuthzResult<Decision> {
        debug!(user = ?user, path, "Checking permissions");
        let dir = path.split_once(':').map(|(_, dir)| dir);
        let membership = self.membership();

        for route in self.model.routes() {
            if !route.applies_to(path, dir) {
                continue;
            }
            let Some(scope) = self.model.scope(route.key()) else {
                continue;
            };
            trace!(route = route.key(), "Evaluating scope");

            if let Some(access) = self.evaluate_scope(&membership, scope, user)? {
                trace!(route = route.key(), access = %access, "Scope decided");
                return Ok(Decision {
                    access,
                    route: Some(route.key().to_string()),
                });
            }
        }

        trace!("No scope applies");
        Ok(Decision::undecided())
    }

    /// Evaluate every rule of a scope; `None` when no rule applies to the user.
    ///
    /// Rules are validated before their selector is considered, so a
    /// malformed rule fails the lookup whoever is asking.
    fn evaluate_scope(
        &self,
        membership: &MembershipResolver<'_>,
        scope: &Section,
        user: Option<&str>,
    ) -> AuthzResult<Option<Access>> {
        let mut groups: Option<Access> = None;
        let mut direct: Option<Access> = None;

        for (selector, rule) in scope.iter() {
            let access = Access::parse_rule(selector, rule)?;
            if self.is_direct(user, selector) {
                direct = Some(access);
            } else if membership.includes(user, selector)? {
                groups = Some(groups.unwrap_or_default() | access);
            }
        }

        Ok(match (groups, direct) {
            (None, None) => None,
            // direct rules extend group rules, never revoke them
            (groups, direct) => Some(groups.unwrap_or_default() | direct.unwrap_or_default()),
        })
    }

    /// Selector names the user directly, or through an alias
    fn is_direct(&self, user: Option<&str>, selector: &str) -> bool {
        let Some(user) = user else {
            return false;
        };
        if selector == user
            || self.model.alias(selector) == Some(user)
            || self.model.alias(user) == Some(selector)
        {
            return true;
        }
        match Selector::parse(selector) {
            Selector::Alias(name) => self.model.alias(name) == Some(user),
            _ => false,
        }
    }
}

impl FromStr for Policy {
    type Err = AuthzError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::load(source.as_bytes())
    }
}

/// Reloadable handle around the current [`Policy`]
///
/// A reload builds a complete new policy before swapping it in, so callers
/// always evaluate against one fully loaded generation.
#[derive(Debug)]
pub struct Authz {
    current: RwLock<Arc<Policy>>,
    mode: MatchMode,
}

impl Authz {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            current: RwLock::new(Arc::new(Policy::empty())),
            mode,
        }
    }

    /// Handle whose first generation is loaded from `path`
    pub fn open(path: impl AsRef<Path>, mode: MatchMode) -> AuthzResult<Self> {
        let policy = Policy::from_path(path, mode)?;
        Ok(Self {
            current: RwLock::new(Arc::new(policy)),
            mode,
        })
    }

    /// Replace the current policy; on error the previous one stays active
    pub fn load<R: BufRead>(&self, reader: R) -> AuthzResult<()> {
        let policy = Policy::load_with_mode(reader, self.mode)?;
        self.swap(policy);
        Ok(())
    }

    pub fn reload_from(&self, path: impl AsRef<Path>) -> AuthzResult<()> {
        let policy = Policy::from_path(path, self.mode)?;
        self.swap(policy);
        Ok(())
    }

    fn swap(&self, policy: Policy) {
        let mut current = self.current.write().unwrap_or_else(|poisoned| {
            tracing::warn!("policy lock poisoned, recovering");
            poisoned.into_inner()
        });
        *current = Arc::new(policy);
        debug!(scopes = current.routes().len(), "Swapped in new authz policy");
    }

    /// Current generation; stays valid across later reloads
    pub fn snapshot(&self) -> Arc<Policy> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| {
                tracing::warn!("policy lock poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    pub fn permissions(&self, user: Option<&str>, path: &str) -> AuthzResult<String> {
        self.snapshot().permissions(user, path)
    }

    pub fn includes(&self, user: Option<&str>, selector: &str) -> AuthzResult<bool> {
        self.snapshot().includes(user, selector)
    }

    pub fn resolve(&self, selector: &str) -> AuthzResult<Members> {
        self.snapshot().resolve(selector)
    }
}

impl Default for Authz {
    fn default() -> Self {
        Self::new(MatchMode::default())
    }
}
