//! Rule selectors
//!
//! A selector is the left-hand side of a path rule or one entry of a group
//! member list. Classification happens in one place so membership
//! resolution and rule matching agree on the syntax.

use std::fmt;

/// Parsed selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Concrete user name
    User(&'a str),
    /// `*`, everyone including anonymous
    All,
    /// `$anonymous`
    Anonymous,
    /// `$authenticated`
    Authenticated,
    /// `&name`
    Alias(&'a str),
    /// `@name`
    Group(&'a str),
    /// `~selector`
    Not(Box<Selector<'a>>),
}

impl<'a> Selector<'a> {
    /// Classify a raw selector string
    pub fn parse(raw: &'a str) -> Self {
        match raw {
            "*" => return Selector::All,
            "$anonymous" => return Selector::Anonymous,
            "$authenticated" => return Selector::Authenticated,
            _ => {}
        }

        if let Some(rest) = raw.strip_prefix('~')
            && !rest.is_empty()
        {
            return Selector::Not(Box::new(Selector::parse(rest)));
        }
        if let Some(name) = raw.strip_prefix('&') {
            return Selector::Alias(name);
        }
        if let Some(name) = raw.strip_prefix('@') {
            return Selector::Group(name);
        }
        Selector::User(raw)
    }
}

impl fmt::Display for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::User(name) => write!(f, "{}", name),
            Selector::All => write!(f, "*"),
            Selector::Anonymous => write!(f, "$anonymous"),
            Selector::Authenticated => write!(f, "$authenticated"),
            Selector::Alias(name) => write!(f, "&{}", name),
            Selector::Group(name) => write!(f, "@{}", name),
            Selector::Not(inner) => write!(f, "~{}", inner),
        }
    }
}
