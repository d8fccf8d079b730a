//! Identity and deployment entities: users, groups, roles, bundles, and
//! session tokens.
//!
//! These are the wire/data types shared by the data-access layer and the
//! REST surface. Relationship *storage* (who keeps which membership set) is
//! a data-access concern; the types here only describe shape.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A mapping from a chat provider to this user's identity on it, used to
/// resolve the acting user for an incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    /// Chat provider identifier (e.g. `"slack"`).
    pub provider: String,
    /// The user's ID on that provider (e.g. `"U024BE7LH"`).
    pub provider_id: String,
}

/// A human who can issue commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    /// SHA-256 hex digest of the user's password. Never serialized outward.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub mappings: Vec<UserMapping>,
}

/// A named set of users carrying a set of roles. Group membership is how
/// users acquire permissions: user -> groups -> roles -> permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub users: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

/// A single permission grant within a role, scoped to a bundle's namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RolePermission {
    pub bundle_name: String,
    pub permission: String,
}

impl fmt::Display for RolePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bundle_name, self.permission)
    }
}

/// A named collection of permissions, attachable to any number of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<RolePermission>,
}

/// A command defined by a bundle, including the access rules that guard it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleCommand {
    #[serde(default)]
    pub description: String,
    /// Access-control rule sources evaluated when this command is invoked.
    /// Stored as text; parsed at evaluation time.
    #[serde(default)]
    pub rules: Vec<String>,
}

/// A versioned, namespaced collection of commands and permission names; the
/// unit of deployment. At most one version of a bundle may be enabled at a
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub commands: BTreeMap<String, BundleCommand>,
    /// Permission names this bundle's namespace defines.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A bearer session token. At most one active token exists per username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The random, base64url-encoded token value.
    pub token: String,
    pub user: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub duration_secs: i64,
}

impl Token {
    /// Build a token valid from `now` for `duration`.
    pub fn new(value: String, user: String, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            token: value,
            user,
            valid_from: now,
            valid_until: now + duration,
            duration_secs: duration.num_seconds(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock, so tests can pin time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_until
    }
}
