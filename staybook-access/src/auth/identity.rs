//! Principal identity
//!
//! The authenticated caller a decision is made for.

use crate::model::{UserId, UserRecord};
use serde::Serialize;
use staybook_core::{validation_error, Role, RoleSet, StaybookResult};

/// An authenticated identity with at least one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    id: UserId,
    roles: RoleSet,
}

impl Principal {
    /// Create a principal, rejecting an empty role set
    pub fn new(id: impl Into<UserId>, roles: RoleSet) -> StaybookResult<Self> {
        if roles.is_empty() {
            return Err(validation_error!(
                "an authenticated principal needs at least one role",
                "role",
                "identity"
            ));
        }
        Ok(Self {
            id: id.into(),
            roles,
        })
    }

    /// Principal for a stored user account
    pub fn from_record(user: &UserRecord) -> StaybookResult<Self> {
        Self::new(user.id.clone(), user.roles.clone())
    }

    pub fn admin(id: impl Into<UserId>) -> Self {
        Self::single(id, Role::Admin)
    }

    pub fn customer(id: impl Into<UserId>) -> Self {
        Self::single(id, Role::Customer)
    }

    pub fn guest(id: impl Into<UserId>) -> Self {
        Self::single(id, Role::Guest)
    }

    fn single(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            roles: RoleSet::only(role),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}
