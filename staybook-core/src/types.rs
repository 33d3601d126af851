//! Core data type definitions

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Roles a user account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unrestricted access to every collection
    Admin,
    /// Owns bookings and may invite guests to them
    Customer,
    /// Joins bookings through an invite
    Guest,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Customer, Role::Guest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Guest => "guest",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "guest" => Ok(Role::Guest),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// An ordered set of roles. Serializes as a plain array, e.g. `["customer", "guest"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// A set holding exactly one role
    pub fn only(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// True when the set holds `role` and nothing else
    pub fn is_exactly(&self, role: Role) -> bool {
        self.0.len() == 1 && self.contains(role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Parses a comma separated list such as `customer,guest`
impl std::str::FromStr for RoleSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<Role>)
            .collect()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaybookConfig {
    pub access: AccessConfig,
    pub invite: InviteConfig,
    pub logging: LoggingConfig,
}

/// Route gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Paths that are always reachable
    pub public_paths: Vec<String>,
    /// Path prefixes that need a session and a subscription
    pub protected_prefixes: Vec<String>,
    /// Protected prefix that additionally needs `admin_entitlement`
    pub admin_prefix: String,
    pub admin_entitlement: String,
    pub login_path: String,
    pub subscribe_path: String,
    /// Where callers without the admin entitlement are sent
    pub admin_fallback_path: String,
    pub auth_cookie: String,
    pub customer_cookie: String,
}

/// Booking invite token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteConfig {
    /// HMAC secret used to sign invite tokens
    pub secret: String,
    /// Token lifetime in hours
    pub ttl_hours: i64,
    pub base_url: String,
    pub accept_path: String,
}
