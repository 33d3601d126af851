//! User write hooks
//!
//! Run before a user record is validated and stored: the coarse access
//! check, audit stamping, then the role assignment rules.

use crate::auth::AccessContext;
use crate::model::{UserDraft, UserRecord, WriteOperation};
use crate::policy::RoleAuthority;
use staybook_core::StaybookResult;
use tracing::debug;

/// Stamp `added_by` with the acting principal on create
pub fn fill_added_by(ctx: &AccessContext, operation: WriteOperation, draft: &mut UserDraft) {
    if operation != WriteOperation::Create || draft.added_by.is_some() {
        return;
    }
    if let Some(id) = ctx.user_id() {
        draft.added_by = Some(id.clone());
    }
}

/// Prepare a draft for a new account; returns the draft as it should be stored
pub fn prepare_user_create(
    authority: &RoleAuthority,
    ctx: &AccessContext,
    mut draft: UserDraft,
) -> StaybookResult<UserDraft> {
    authority
        .can_create_user(ctx, draft.roles.as_ref())
        .check("create users")?;

    fill_added_by(ctx, WriteOperation::Create, &mut draft);
    draft.roles = authority.validate_role_assignment(
        ctx,
        WriteOperation::Create,
        draft.roles.as_ref(),
        None,
    )?;

    debug!(context = %ctx.summary(), roles = ?draft.roles, "User create prepared");
    Ok(draft)
}

/// Prepare an update of `target`; the target's current roles are the baseline
pub fn prepare_user_update(
    authority: &RoleAuthority,
    ctx: &AccessContext,
    target: &UserRecord,
    mut draft: UserDraft,
) -> StaybookResult<UserDraft> {
    authority.authorize_update_user(ctx, target)?;

    fill_added_by(ctx, WriteOperation::Update, &mut draft);
    draft.roles = authority.validate_role_assignment(
        ctx,
        WriteOperation::Update,
        draft.roles.as_ref(),
        Some(&target.roles),
    )?;
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::model::UserId;
    use staybook_core::{Role, RoleSet, StaybookError};

    fn draft(roles: Option<&[Role]>) -> UserDraft {
        UserDraft {
            name: Some("Sam".to_string()),
            email: Some("sam@example.com".to_string()),
            roles: roles.map(RoleSet::of),
            added_by: None,
        }
    }

    #[test]
    fn test_self_registration_becomes_guest() {
        let authority = RoleAuthority::new();
        let prepared =
            prepare_user_create(&authority, &AccessContext::anonymous(), draft(None)).unwrap();
        assert_eq!(prepared.roles, Some(RoleSet::only(Role::Guest)));
        assert_eq!(prepared.added_by, None);
    }

    #[test]
    fn test_anonymous_cannot_register_as_customer() {
        let authority = RoleAuthority::new();
        let err = prepare_user_create(
            &authority,
            &AccessContext::anonymous(),
            draft(Some(&[Role::Customer])),
        )
        .unwrap_err();
        assert!(err.to_string().contains("self-register as guest"));
    }

    #[test]
    fn test_customer_provisions_guest() {
        let authority = RoleAuthority::new();
        let ctx = AccessContext::user(Principal::customer("c1"));
        let prepared =
            prepare_user_create(&authority, &ctx, draft(Some(&[Role::Guest]))).unwrap();
        assert_eq!(prepared.added_by, Some(UserId::from("c1")));
    }

    #[test]
    fn test_explicit_added_by_is_kept() {
        let ctx = AccessContext::user(Principal::admin("a1"));
        let mut user = draft(None);
        user.added_by = Some(UserId::from("c7"));
        fill_added_by(&ctx, WriteOperation::Create, &mut user);
        assert_eq!(user.added_by, Some(UserId::from("c7")));
    }

    #[test]
    fn test_update_is_self_scoped() {
        let authority = RoleAuthority::new();
        let ctx = AccessContext::user(Principal::customer("c1"));
        let other = UserRecord {
            id: "c2".into(),
            name: None,
            email: "c2@example.com".to_string(),
            roles: RoleSet::only(Role::Customer),
            added_by: None,
        };
        let err = prepare_user_update(&authority, &ctx, &other, draft(None)).unwrap_err();
        assert!(matches!(err, StaybookError::PermissionDenied { .. }));

        let me = UserRecord {
            id: "c1".into(),
            ..other
        };
        let prepared =
            prepare_user_update(&authority, &ctx, &me, draft(Some(&[Role::Customer]))).unwrap();
        assert_eq!(prepared.roles, Some(RoleSet::only(Role::Customer)));
        assert_eq!(prepared.added_by, None);
    }
}
