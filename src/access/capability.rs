//! Capability model for cove access control.
//!
//! Capabilities form a total order; every resolution question reduces to
//! "what is the maximum rank reachable through any applicable rule".

use std::fmt;
use std::str::FromStr;

/// Level of access a subject has on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Capability {
    /// No access.
    #[default]
    None = 0,
    /// May see the entity and read file contents.
    View = 1,
    /// May add files. Never produced by stored-grant resolution; exists as
    /// a rank threshold for caller policy.
    Upload = 2,
    /// Full control. Derived from ownership or administrator status only,
    /// never stored as a grant.
    Manage = 3,
}

impl Capability {
    /// Numeric rank of this capability.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Map a rank back to a named capability.
    ///
    /// Collapses to the closed set stored-grant resolution can yield:
    /// ranks 1 and 2 both map to `View`.
    pub fn from_rank(rank: u8) -> Self {
        if rank >= 3 {
            Capability::Manage
        } else if rank >= 1 {
            Capability::View
        } else {
            Capability::None
        }
    }

    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::None => "none",
            Capability::View => "view",
            Capability::Upload => "upload",
            Capability::Manage => "manage",
        }
    }

    /// Check whether this capability satisfies a required level.
    pub fn allows(&self, required: Capability) -> bool {
        *self >= required
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Capability::None),
            "view" => Ok(Capability::View),
            "upload" => Ok(Capability::Upload),
            "manage" => Ok(Capability::Manage),
            _ => Err(format!("unknown capability: {s}")),
        }
    }
}

impl TryFrom<String> for Capability {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Entity addressable by a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A folder in the hierarchy.
    Folder,
    /// A file record.
    File,
}

impl EntityKind {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Folder => "folder",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target of a grant: a role or a specific user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectType {
    /// All users holding a role, keyed by role identifier.
    Role,
    /// A single user, keyed by decimal user id.
    User,
}

impl SubjectType {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Role => "role",
            SubjectType::User => "user",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "role" => Ok(SubjectType::Role),
            "user" => Ok(SubjectType::User),
            _ => Err(format!("unknown subject type: {s}")),
        }
    }
}

impl TryFrom<String> for SubjectType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
