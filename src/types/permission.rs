use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Permission level carried by a user or group membership.
///
/// Levels are ordered: admin implies read_write implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    ReadWrite,
    Admin,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::Read, Permission::ReadWrite, Permission::Admin];

    /// Returns true if this level satisfies the required level.
    #[must_use]
    pub fn has(self, required: Permission) -> bool {
        self >= required
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::ReadWrite => "read_write",
            Permission::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Permission> {
        match s {
            "read" => Some(Permission::Read),
            "read_write" => Some(Permission::ReadWrite),
            "admin" => Some(Permission::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s).ok_or_else(|| Error::validation(format!("invalid permission: {s}")))
    }
}

/// Default access a collection grants to every member of its team.
///
/// A collection whose permission is `Option::None` is private; `None` here is
/// an explicit "no default access" setting that is still not private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPermission {
    None,
    Read,
    ReadWrite,
    Admin,
}

impl CollectionPermission {
    /// The membership level this default is equivalent to, if any.
    #[must_use]
    pub const fn as_permission(self) -> Option<Permission> {
        match self {
            CollectionPermission::None => None,
            CollectionPermission::Read => Some(Permission::Read),
            CollectionPermission::ReadWrite => Some(Permission::ReadWrite),
            CollectionPermission::Admin => Some(Permission::Admin),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CollectionPermission::None => "none",
            CollectionPermission::Read => "read",
            CollectionPermission::ReadWrite => "read_write",
            CollectionPermission::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<CollectionPermission> {
        match s {
            "none" => Some(CollectionPermission::None),
            other => Permission::parse(other).map(CollectionPermission::from),
        }
    }
}

impl From<Permission> for CollectionPermission {
    fn from(p: Permission) -> Self {
        match p {
            Permission::Read => CollectionPermission::Read,
            Permission::ReadWrite => CollectionPermission::ReadWrite,
            Permission::Admin => CollectionPermission::Admin,
        }
    }
}

impl fmt::Display for CollectionPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionPermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionPermission::parse(s)
            .ok_or_else(|| Error::validation(format!("invalid collection permission: {s}")))
    }
}

/// Team role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Member,
    Viewer,
    Guest,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
            UserRole::Viewer => "viewer",
            UserRole::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Option<UserRole> {
        match s {
            "admin" => Some(UserRole::Admin),
            "member" => Some(UserRole::Member),
            "viewer" => Some(UserRole::Viewer),
            "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::parse(s).ok_or_else(|| Error::validation(format!("invalid role: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_has() {
        assert!(Permission::Admin.has(Permission::ReadWrite));
        assert!(Permission::ReadWrite.has(Permission::Read));
        assert!(!Permission::Read.has(Permission::ReadWrite));
    }

    #[test]
    fn test_parse_permission() {
        assert_eq!(Permission::parse("read_write"), Some(Permission::ReadWrite));
        assert_eq!(Permission::parse("none"), None);
        assert!("owner".parse::<Permission>().is_err());
    }

    #[test]
    fn test_collection_permission_none_grants_nothing() {
        assert_eq!(CollectionPermission::None.as_permission(), None);
        assert_eq!(
            CollectionPermission::parse("read"),
            Some(CollectionPermission::Read)
        );
        assert_eq!(
            CollectionPermission::parse("none"),
            Some(CollectionPermission::None)
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Permission::ReadWrite).unwrap();
        assert_eq!(json, "\"read_write\"");
        let role: UserRole = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, UserRole::Viewer);
    }
}
