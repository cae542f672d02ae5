//! Membership resolution
//!
//! Expands alias and group references into flat, ordered sets of concrete
//! user names and decides whether a user satisfies a selector.

use crate::authz::model::PolicyModel;
use crate::authz::selector::Selector;
use crate::error::{AuthzError, AuthzResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Flattened member list; duplicates removed, first-seen order kept
pub type Members = Arc<[String]>;

/// Memoized group expansions for one loaded policy
///
/// Entries are only ever added, and only for fully resolved groups.
#[derive(Debug, Default)]
pub struct MembershipCache {
    groups: RwLock<HashMap<String, Members>>,
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Members>> {
        self.groups.read().unwrap_or_else(|poisoned| {
            tracing::warn!("membership cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Members>> {
        self.groups.write().unwrap_or_else(|poisoned| {
            tracing::warn!("membership cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, group: &str) -> Option<Members> {
        self.read().get(group).cloned()
    }

    fn insert(&self, group: &str, members: Members) {
        self.write().insert(group.to_string(), members);
    }

    /// Number of groups resolved so far
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Resolver over one model and its cache
#[derive(Debug, Clone, Copy)]
pub struct MembershipResolver<'a> {
    model: &'a PolicyModel,
    cache: &'a MembershipCache,
}

impl<'a> MembershipResolver<'a> {
    pub fn new(model: &'a PolicyModel, cache: &'a MembershipCache) -> Self {
        Self { model, cache }
    }

    /// Expand a selector into the user names it denotes.
    ///
    /// Anything other than an `&alias` or `@group` reference denotes itself.
    pub fn resolve(&self, selector: &str) -> AuthzResult<Members> {
        let mut stack = Vec::new();
        self.resolve_with(selector, &mut stack)
    }

    fn resolve_with(&self, raw: &str, stack: &mut Vec<String>) -> AuthzResult<Members> {
        match Selector::parse(raw) {
            Selector::Alias(name) => {
                let target = self
                    .model
                    .alias(name)
                    .ok_or_else(|| AuthzError::undefined(raw))?;
                Ok(Arc::from(vec![target.to_string()]))
            }
            Selector::Group(name) => self.resolve_group(name, raw, stack),
            _ => Ok(Arc::from(vec![raw.to_string()])),
        }
    }

    fn resolve_group(
        &self,
        name: &str,
        raw: &str,
        stack: &mut Vec<String>,
    ) -> AuthzResult<Members> {
        if let Some(members) = self.cache.get(name) {
            return Ok(members);
        }
        if stack.iter().any(|g| g == name) {
            return Err(AuthzError::cycle(raw));
        }
        let entries = self
            .model
            .group(name)
            .ok_or_else(|| AuthzError::undefined(raw))?;

        stack.push(name.to_string());
        let mut flat: Vec<String> = Vec::new();
        for entry in entries {
            for user in self.resolve_with(entry, stack)?.iter() {
                if !flat.contains(user) {
                    flat.push(user.clone());
                }
            }
        }
        stack.pop();

        trace!(group = name, members = flat.len(), "Resolved group");
        let members: Members = flat.into();
        self.cache.insert(name, members.clone());
        Ok(members)
    }

    /// Decide whether `user` (`None` for anonymous) satisfies `selector`.
    pub fn includes(&self, user: Option<&str>, selector: &str) -> AuthzResult<bool> {
        if user == Some(selector) {
            return Ok(true);
        }
        match Selector::parse(selector) {
            Selector::All => Ok(true),
            Selector::Anonymous => Ok(user.is_none()),
            Selector::Authenticated => Ok(user.is_some()),
            Selector::Not(inner) => Ok(!self.includes(user, &inner.to_string())?),
            Selector::User(_) => Ok(false),
            Selector::Alias(_) | Selector::Group(_) => {
                let members = self.resolve(selector)?;
                Ok(user.is_some_and(|u| members.iter().any(|m| m == u)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::parser::parse_str;
    use crate::authz::patterns::MatchMode;

    const NAMES: &str = "\
[aliases]
admin=administrator
[groups]
g1=&admin,user1
g2=user2,user3
g3=@g1,user4
g5=g5
g6=@g4
g7=&missing
g8=@g1,@g3,user1
";

    fn model(source: &str) -> PolicyModel {
        PolicyModel::from_sections(parse_str(source).unwrap(), MatchMode::Literal).unwrap()
    }

    fn names(members: Members) -> Vec<String> {
        members.to_vec()
    }

    #[test]
    fn test_resolve_alias_and_groups() {
        let m = model(NAMES);
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);

        assert_eq!(names(r.resolve("&admin").unwrap()), ["administrator"]);
        assert_eq!(names(r.resolve("@g1").unwrap()), ["administrator", "user1"]);
        assert_eq!(names(r.resolve("@g2").unwrap()), ["user2", "user3"]);
        assert_eq!(
            names(r.resolve("@g3").unwrap()),
            ["administrator", "user1", "user4"]
        );
        assert_eq!(names(r.resolve("@g5").unwrap()), ["g5"]);
    }

    #[test]
    fn test_literal_denotes_itself() {
        let m = model(NAMES);
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert_eq!(names(r.resolve("user9").unwrap()), ["user9"]);
        assert_eq!(names(r.resolve("*").unwrap()), ["*"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let m = model(NAMES);
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert_eq!(
            names(r.resolve("@g8").unwrap()),
            ["administrator", "user1", "user4"]
        );
    }

    #[test]
    fn test_undefined_references() {
        let m = model(NAMES);
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert!(matches!(
            r.resolve("@g6"),
            Err(AuthzError::UndefinedReference { .. })
        ));
        assert!(matches!(
            r.resolve("@g7"),
            Err(AuthzError::UndefinedReference { .. })
        ));
        assert!(matches!(
            r.resolve("&nobody"),
            Err(AuthzError::UndefinedReference { .. })
        ));
    }

    #[test]
    fn test_cycle_detected_from_either_end() {
        let m = model("[groups]\ng6=@g7\ng7=@g6\n");
        for start in ["@g6", "@g7"] {
            let cache = MembershipCache::new();
            let r = MembershipResolver::new(&m, &cache);
            let err = r.resolve(start).unwrap_err();
            assert!(matches!(err, AuthzError::CycleDetected { .. }), "{start}");
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let m = model("[groups]\nloop=user1,@loop\n");
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert!(matches!(
            r.resolve("@loop"),
            Err(AuthzError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let m = model("[groups]\ntop=@left,@right\nleft=@base\nright=@base\nbase=u1\n");
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert_eq!(names(r.resolve("@top").unwrap()), ["u1"]);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_cache_is_filled() {
        let m = model(NAMES);
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        r.resolve("@g3").unwrap();
        assert!(cache.get("g3").is_some());
        assert!(cache.get("g1").is_some());
        assert!(cache.get("g2").is_none());
    }

    #[test]
    fn test_includes_conventions() {
        let m = model("[aliases]\nadmin=administrator\n[groups]\ng1=user1,&admin\n");
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);

        assert!(r.includes(Some("user0"), "user0").unwrap());
        assert!(r.includes(Some("userxxx"), "*").unwrap());
        assert!(r.includes(None, "$anonymous").unwrap());
        assert!(r.includes(Some("userxx"), "$authenticated").unwrap());
        assert!(r.includes(Some("administrator"), "&admin").unwrap());
        assert!(r.includes(Some("user1"), "@g1").unwrap());
        assert!(r.includes(Some("administrator"), "@g1").unwrap());
        assert!(r.includes(Some("user1"), "~user2").unwrap());
        assert!(!r.includes(Some("user1"), "user2").unwrap());
        assert!(!r.includes(Some("user0"), "~user0").unwrap());
        assert!(!r.includes(Some("userxxx"), "~*").unwrap());
        assert!(!r.includes(None, "~$anonymous").unwrap());
        assert!(!r.includes(Some("userxx"), "~$authenticated").unwrap());
        assert!(!r.includes(Some("administrator"), "~&admin").unwrap());
        assert!(!r.includes(Some("user1"), "~@g1").unwrap());
        assert!(!r.includes(Some("administrator"), "~@g1").unwrap());
    }

    #[test]
    fn test_anonymous_user() {
        let m = model("[groups]\ng1=user1\n");
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);

        assert!(r.includes(None, "*").unwrap());
        assert!(!r.includes(None, "$authenticated").unwrap());
        assert!(r.includes(None, "~$authenticated").unwrap());
        assert!(!r.includes(None, "user1").unwrap());
        assert!(!r.includes(None, "@g1").unwrap());
        assert!(r.includes(None, "~@g1").unwrap());
        assert!(!r.includes(Some("user1"), "$anonymous").unwrap());
    }

    #[test]
    fn test_includes_propagates_errors() {
        let m = model("[groups]\ng6=@g7\ng7=@g6\n");
        let cache = MembershipCache::new();
        let r = MembershipResolver::new(&m, &cache);
        assert!(r.includes(Some("u"), "~@g6").is_err());
        assert!(matches!(
            r.includes(Some("u"), "&missing"),
            Err(AuthzError::UndefinedReference { .. })
        ));
    }
}
