//! Permission sets granted by path rules

use crate::error::{AuthzError, AuthzResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of permissions drawn from `{r, w}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Access {
    read: bool,
    write: bool,
}

impl Access {
    pub const NONE: Access = Access {
        read: false,
        write: false,
    };
    pub const READ: Access = Access {
        read: true,
        write: false,
    };
    pub const WRITE: Access = Access {
        read: false,
        write: true,
    };
    pub const READ_WRITE: Access = Access {
        read: true,
        write: true,
    };

    /// Parse the right-hand side of a path rule.
    ///
    /// Every character must be `r` or `w`; an empty rule is a valid explicit
    /// revocation.
    pub fn parse_rule(selector: &str, rule: &str) -> AuthzResult<Self> {
        let mut access = Access::NONE;
        for c in rule.chars() {
            match c {
                'r' => access.read = true,
                'w' => access.write = true,
                _ => return Err(AuthzError::invalid_rule(selector, rule)),
            }
        }
        Ok(access)
    }

    pub const fn can_read(&self) -> bool {
        self.read
    }

    pub const fn can_write(&self) -> bool {
        self.write
    }

    pub const fn is_empty(&self) -> bool {
        !self.read && !self.write
    }

    /// Canonical rendering: `r` before `w`
    pub const fn as_str(&self) -> &'static str {
        match (self.read, self.write) {
            (false, false) => "",
            (true, false) => "r",
            (false, true) => "w",
            (true, true) => "rw",
        }
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access {
            read: self.read || rhs.read,
            write: self.write || rhs.write,
        }
    }
}

impl BitOrAssign for Access {
    fn bitor_assign(&mut self, rhs: Access) {
        *self = *self | rhs;
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Access {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        assert_eq!(Access::parse_rule("u", "").unwrap(), Access::NONE);
        assert_eq!(Access::parse_rule("u", "r").unwrap(), Access::READ);
        assert_eq!(Access::parse_rule("u", "w").unwrap(), Access::WRITE);
        assert_eq!(Access::parse_rule("u", "rw").unwrap(), Access::READ_WRITE);
        assert_eq!(Access::parse_rule("u", "wr").unwrap(), Access::READ_WRITE);
    }

    #[test]
    fn test_garbage_rule() {
        let err = Access::parse_rule("user1", "garbage").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("user1='garbage'"));
    }

    #[test]
    fn test_union_is_additive() {
        let mut access = Access::READ;
        access |= Access::NONE;
        assert_eq!(access, Access::READ);
        access |= Access::WRITE;
        assert_eq!(access, Access::READ_WRITE);
    }

    #[test]
    fn test_canonical_rendering() {
        assert_eq!(Access::NONE.to_string(), "");
        assert_eq!((Access::WRITE | Access::READ).to_string(), "rw");
        assert!(Access::READ.can_read());
        assert!(!Access::READ.can_write());
        assert!(Access::NONE.is_empty());
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(
            serde_json::to_string(&Access::READ_WRITE).unwrap(),
            r#""rw""#
        );
    }
}
