//! Subversion-style Path-Based Authorization
//!
//! Computes the permissions an authz file grants a user on a repository path.
//!
//! ## Features
//!
//! - **INI-style authz files** with `[aliases]`, `[groups]` and path sections
//! - **Nested groups** flattened recursively, with cycle detection and caching
//! - **Selectors** for users, `*`, `$anonymous`, `$authenticated`, `~negation`,
//!   `&alias` and `@group`
//! - **Most-specific-path-wins** evaluation with additive rule merging
//! - **Atomic reloads** through the [`Authz`] handle
//!
//! ## Example
//!
//! ```
//! use svn_authz::Policy;
//!
//! let policy: Policy = "
//! [groups]
//! devs = harry, sally
//! [/]
//! * = r
//! [repo:/trunk]
//! @devs = rw
//! "
//! .parse()
//! .unwrap();
//!
//! assert_eq!(policy.permissions(Some("harry"), "repo:/trunk/src").unwrap(), "rw");
//! assert_eq!(policy.permissions(None, "repo:/trunk").unwrap(), "r");
//! ```
//!
//! The engine never enforces anything; it only reports what would apply.

pub mod authz;
pub mod config;
pub mod error;

// Re-export main types
pub use authz::{Access, Authz, Decision, MatchMode, Policy};
pub use config::{AppConfig, load_config};
pub use error::{AppError, AuthzError, ConfigError, Result};
