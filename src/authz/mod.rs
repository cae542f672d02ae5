//! Authz policy engine
//!
//! Evaluates Subversion-style path-based authorization files.
//!
//! ## Evaluation Model
//!
//! A source is parsed into sections. `[aliases]` and `[groups]` define names;
//! every other section is a path scope keyed `repository:path` or `path`.
//!
//! Scopes are ordered most specific first (path, then repository, both in
//! descending string order). For a query, the first scope whose key prefixes
//! the full path or its directory part and that contains at least one rule
//! applying to the user decides:
//! - rules naming the user (directly or through an alias) are merged with
//!   rules the user satisfies through `*`, `$anonymous`, `$authenticated`,
//!   `~negation`, `&alias` or `@group`
//! - merging only ever adds permissions
//!
//! ## Example
//!
//! ```text
//! [aliases]
//! harry = Harry
//!
//! [groups]
//! calc-developers = &harry, sally
//!
//! [calc:/projects/calc]
//! @calc-developers = rw
//!
//! [calc:/projects/calc/tags]
//! ~@calc-owners = r
//! ```

pub mod evaluator;
pub mod membership;
pub mod model;
pub mod parser;
pub mod patterns;
pub mod rule;
pub mod selector;

pub use evaluator::{Authz, Decision, Policy};
pub use membership::{MembershipCache, MembershipResolver, Members};
pub use model::{PolicyModel, Route, RouteKey};
pub use parser::{Section, Sections, parse, parse_str};
pub use patterns::{MatchMode, PrefixMatcher};
pub use rule::Access;
pub use selector::Selector;
