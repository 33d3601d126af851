//! Role-based access policy
//!
//! `RoleAuthority` answers every guarded question about the Users and
//! Bookings collections. Decisions are pure functions of the caller, the
//! record snapshot and the proposed change; nothing here performs I/O.

pub mod bookings;
pub mod decision;
pub mod fields;
pub mod filter;
pub mod users;

pub use bookings::BookingPolicy;
pub use decision::Decision;
pub use fields::{BookingField, FieldRule};
pub use filter::{FilterTarget, RecordFilter};
pub use users::UserPolicy;

use crate::auth::AccessContext;
use crate::model::{BookingPatch, BookingRecord, Operation, UserRecord, WriteOperation};
use staybook_core::{RoleSet, StaybookResult};
use tracing::debug;

/// Record-level policy of one collection
pub trait CollectionPolicy {
    type Record: FilterTarget;

    /// Collection name used in messages and logs
    const SLUG: &'static str;

    fn can_create(&self, ctx: &AccessContext) -> Decision;
    fn can_read(&self, ctx: &AccessContext) -> Decision;
    fn can_update(&self, ctx: &AccessContext) -> Decision;
    fn can_delete(&self, ctx: &AccessContext) -> Decision;

    fn decide(&self, ctx: &AccessContext, operation: Operation) -> Decision {
        match operation {
            Operation::Create => self.can_create(ctx),
            Operation::Read => self.can_read(ctx),
            Operation::Update => self.can_update(ctx),
            Operation::Delete => self.can_delete(ctx),
        }
    }

    /// Resolve the decision for `operation` against a record snapshot
    fn authorize(
        &self,
        ctx: &AccessContext,
        operation: Operation,
        record: &Self::Record,
    ) -> StaybookResult<()> {
        let decision = self.decide(ctx, operation);
        let label = format!("{} {}", operation, Self::SLUG);
        let result = decision.check_record(record, &label);
        if result.is_err() {
            debug!(
                context = %ctx.summary(),
                decision = %decision,
                operation = %label,
                "Access denied"
            );
        }
        result
    }

    /// Filter a listing query must apply for this caller (`None` = everything)
    fn read_filter(&self, ctx: &AccessContext) -> StaybookResult<Option<RecordFilter>> {
        self.can_read(ctx)
            .into_filter(&format!("{} {}", Operation::Read, Self::SLUG))
    }
}

/// Central access policy for users and bookings
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthority {
    users: UserPolicy,
    bookings: BookingPolicy,
}

impl RoleAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &UserPolicy {
        &self.users
    }

    pub fn bookings(&self) -> &BookingPolicy {
        &self.bookings
    }

    // Users

    pub fn can_access_admin(&self, ctx: &AccessContext) -> Decision {
        self.users.can_access_admin(ctx)
    }

    pub fn can_create_user(&self, ctx: &AccessContext, proposed: Option<&RoleSet>) -> Decision {
        self.users.can_create_user(ctx, proposed)
    }

    pub fn can_read_user(&self, ctx: &AccessContext) -> Decision {
        self.users.can_read_user(ctx)
    }

    pub fn can_update_user(&self, ctx: &AccessContext) -> Decision {
        self.users.can_update_user(ctx)
    }

    pub fn can_delete_user(&self, ctx: &AccessContext) -> Decision {
        self.users.can_delete_user(ctx)
    }

    pub fn can_unlock_user(&self, ctx: &AccessContext) -> Decision {
        self.users.can_unlock_user(ctx)
    }

    pub fn validate_role_assignment(
        &self,
        ctx: &AccessContext,
        operation: WriteOperation,
        proposed: Option<&RoleSet>,
        original: Option<&RoleSet>,
    ) -> StaybookResult<Option<RoleSet>> {
        self.users
            .validate_role_assignment(ctx, operation, proposed, original)
    }

    pub fn authorize_read_user(&self, ctx: &AccessContext, target: &UserRecord) -> StaybookResult<()> {
        self.users.authorize(ctx, Operation::Read, target)
    }

    pub fn authorize_update_user(
        &self,
        ctx: &AccessContext,
        target: &UserRecord,
    ) -> StaybookResult<()> {
        self.users.authorize(ctx, Operation::Update, target)
    }

    pub fn authorize_delete_user(
        &self,
        ctx: &AccessContext,
        target: &UserRecord,
    ) -> StaybookResult<()> {
        self.users.authorize(ctx, Operation::Delete, target)
    }

    // Bookings

    pub fn can_create_booking(&self, ctx: &AccessContext) -> Decision {
        self.bookings.can_create_booking(ctx)
    }

    pub fn can_read_booking(&self, ctx: &AccessContext) -> Decision {
        self.bookings.can_read_booking(ctx)
    }

    pub fn can_update_booking(&self, ctx: &AccessContext) -> Decision {
        self.bookings.can_update_booking(ctx)
    }

    pub fn can_delete_booking(&self, ctx: &AccessContext) -> Decision {
        self.bookings.can_delete_booking(ctx)
    }

    pub fn can_update_booking_field(&self, ctx: &AccessContext, field: BookingField) -> Decision {
        self.bookings.can_update_booking_field(ctx, field)
    }

    pub fn authorize_read_booking(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
    ) -> StaybookResult<()> {
        self.bookings.authorize(ctx, Operation::Read, booking)
    }

    pub fn authorize_delete_booking(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
    ) -> StaybookResult<()> {
        self.bookings.authorize(ctx, Operation::Delete, booking)
    }

    /// Record rule, then the rule of every changed field. The first failure wins.
    pub fn authorize_booking_update(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
        changed: &[BookingField],
    ) -> StaybookResult<()> {
        self.bookings.authorize(ctx, Operation::Update, booking)?;
        for field in changed {
            let label = format!("update {}.{}", BookingPolicy::SLUG, field);
            self.can_update_booking_field(ctx, *field)
                .check_record(booking, &label)
                .inspect_err(|_| {
                    debug!(context = %ctx.summary(), field = %field, "Field update denied");
                })?;
        }
        Ok(())
    }

    /// Apply `patch` to a copy of the stored booking and authorize every field
    /// that ends up different, derived ones included. Returns the updated
    /// record only when all rules pass.
    pub fn update_booking(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
        patch: BookingPatch,
    ) -> StaybookResult<BookingRecord> {
        let updated = patch.apply(booking.clone());
        let changed = booking.changed_fields(&updated);
        self.authorize_booking_update(ctx, booking, &changed)?;
        Ok(updated)
    }
}
