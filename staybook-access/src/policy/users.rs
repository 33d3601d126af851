//! Users collection policy

use super::filter::{fields, RecordFilter};
use super::{CollectionPolicy, Decision};
use crate::auth::AccessContext;
use crate::model::{UserRecord, WriteOperation};
use staybook_core::{permission_denied, role_escalation, Role, RoleSet, StaybookResult};
use tracing::debug;

const COMPONENT: &str = "user_policy";

#[derive(Debug, Clone, Copy, Default)]
pub struct UserPolicy;

impl UserPolicy {
    /// Any authenticated principal may open the admin panel
    pub fn can_access_admin(&self, ctx: &AccessContext) -> Decision {
        Decision::allow_when(ctx.is_authenticated(), "sign in to access the admin panel")
    }

    /// Coarse create check. `proposed` is the role set carried by the draft, if any.
    pub fn can_create_user(&self, ctx: &AccessContext, proposed: Option<&RoleSet>) -> Decision {
        if ctx.is_admin() {
            return Decision::Allow;
        }

        let wants_admin = proposed.is_some_and(|roles| roles.contains(Role::Admin));
        if ctx.has_role(Role::Customer) {
            return Decision::allow_when(!wants_admin, "customers cannot create admin users");
        }

        if ctx.is_authenticated() {
            return Decision::deny("guests cannot create users");
        }

        match proposed {
            None => Decision::Allow,
            Some(roles) if roles.is_exactly(Role::Guest) => Decision::Allow,
            Some(_) => Decision::deny("anonymous users may only self-register as guest"),
        }
    }

    /// Admins see everyone; other principals see themselves and guest accounts
    pub fn can_read_user(&self, ctx: &AccessContext) -> Decision {
        match ctx.user_id() {
            None => Decision::deny("sign in to view users"),
            Some(_) if ctx.is_admin() => Decision::Allow,
            Some(id) => Decision::allow_if(RecordFilter::Any(vec![
                RecordFilter::equals(fields::ID, id),
                RecordFilter::contains(fields::ROLE, Role::Guest),
            ])),
        }
    }

    /// Admins update anyone; everyone else only themselves
    pub fn can_update_user(&self, ctx: &AccessContext) -> Decision {
        match ctx.user_id() {
            None => Decision::deny("sign in to update users"),
            Some(_) if ctx.is_admin() => Decision::Allow,
            Some(id) => Decision::allow_if(RecordFilter::equals(fields::ID, id)),
        }
    }

    pub fn can_delete_user(&self, ctx: &AccessContext) -> Decision {
        Decision::allow_when(ctx.is_admin(), "only admins can delete users")
    }

    pub fn can_unlock_user(&self, ctx: &AccessContext) -> Decision {
        Decision::allow_when(ctx.is_admin(), "only admins can unlock users")
    }

    /// Check a write to a user's `role` field.
    ///
    /// Returns the roles to store: anonymous registrations are normalized to
    /// `{guest}`, everything else passes through unchanged. `None` means the
    /// write leaves roles alone.
    pub fn validate_role_assignment(
        &self,
        ctx: &AccessContext,
        operation: WriteOperation,
        proposed: Option<&RoleSet>,
        original: Option<&RoleSet>,
    ) -> StaybookResult<Option<RoleSet>> {
        if ctx.is_anonymous() {
            return validate_anonymous(operation, proposed);
        }

        if ctx.is_admin() {
            return Ok(proposed.cloned());
        }

        let Some(proposed) = proposed else {
            return Ok(None);
        };

        if proposed.contains(Role::Admin) {
            return Err(reject(
                ctx,
                Role::Admin,
                "You do not have permission to assign the \"admin\" role.",
            ));
        }

        if proposed.contains(Role::Customer) {
            match operation {
                WriteOperation::Create => {
                    return Err(reject(
                        ctx,
                        Role::Customer,
                        "You do not have permission to create users with the \"customer\" role.",
                    ));
                }
                WriteOperation::Update
                    if !original.is_some_and(|roles| roles.contains(Role::Customer)) =>
                {
                    return Err(reject(
                        ctx,
                        Role::Customer,
                        "You do not have permission to grant the \"customer\" role.",
                    ));
                }
                WriteOperation::Update => {}
            }
        }

        let allowed = allowed_roles(ctx);
        if let Some(role) = proposed.iter().find(|role| !allowed.contains(*role)) {
            let message = if ctx.has_role(Role::Customer) {
                "As a customer, you can only assign or maintain \"customer\" or \"guest\" roles."
                    .to_string()
            } else if ctx.is_guest_only() {
                "As a guest, you can only assign or maintain the \"guest\" role.".to_string()
            } else {
                format!("You do not have permission to set the role \"{}\".", role)
            };
            return Err(reject(ctx, role, &message));
        }

        if ctx.is_guest_only() && proposed.contains(Role::Customer) {
            return Err(reject(
                ctx,
                Role::Customer,
                "Guest users cannot assign the \"customer\" role to themselves or others.",
            ));
        }

        Ok(Some(proposed.clone()))
    }
}

impl CollectionPolicy for UserPolicy {
    type Record = UserRecord;
    const SLUG: &'static str = "users";

    fn can_create(&self, ctx: &AccessContext) -> Decision {
        self.can_create_user(ctx, None)
    }

    fn can_read(&self, ctx: &AccessContext) -> Decision {
        self.can_read_user(ctx)
    }

    fn can_update(&self, ctx: &AccessContext) -> Decision {
        self.can_update_user(ctx)
    }

    fn can_delete(&self, ctx: &AccessContext) -> Decision {
        self.can_delete_user(ctx)
    }
}

fn validate_anonymous(
    operation: WriteOperation,
    proposed: Option<&RoleSet>,
) -> StaybookResult<Option<RoleSet>> {
    if operation != WriteOperation::Create {
        return Err(permission_denied!(
            "You must be logged in to perform this operation.",
            COMPONENT,
            "validate_role_assignment"
        ));
    }

    match proposed {
        None => Ok(Some(RoleSet::only(Role::Guest))),
        Some(roles) if roles.is_empty() => {
            debug!("Anonymous registration sent an empty role list");
            Err(permission_denied!(
                "Anonymous users can only be created with the \"guest\" role.",
                COMPONENT,
                "validate_role_assignment"
            ))
        }
        Some(roles) if roles.is_exactly(Role::Guest) => Ok(Some(roles.clone())),
        Some(roles) => {
            let offending = roles
                .iter()
                .find(|role| *role != Role::Guest)
                .unwrap_or(Role::Customer);
            debug!(roles = %roles, "Anonymous registration asked for more than guest");
            Err(role_escalation!(
                offending,
                "Anonymous users can only be created with the \"guest\" role.",
                COMPONENT
            ))
        }
    }
}

/// Roles a non-admin may put on an account
fn allowed_roles(ctx: &AccessContext) -> RoleSet {
    let mut allowed = RoleSet::only(Role::Guest);
    if ctx.has_role(Role::Customer) {
        allowed.insert(Role::Customer);
    }
    allowed
}

fn reject(ctx: &AccessContext, role: Role, message: &str) -> staybook_core::StaybookError {
    debug!(context = %ctx.summary(), role = %role, "Role assignment rejected");
    role_escalation!(role, message, COMPONENT)
}
