//! Bookings collection policy

use super::fields::BookingField;
use super::filter::{fields, RecordFilter};
use super::{CollectionPolicy, Decision};
use crate::auth::AccessContext;
use crate::model::BookingRecord;
use staybook_core::Role;

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingPolicy;

impl BookingPolicy {
    pub fn can_create_booking(&self, ctx: &AccessContext) -> Decision {
        if ctx.is_anonymous() {
            return Decision::deny("sign in to create bookings");
        }
        Decision::allow_when(
            ctx.is_admin() || ctx.has_role(Role::Customer),
            "only customers and admins can create bookings",
        )
    }

    pub fn can_read_booking(&self, ctx: &AccessContext) -> Decision {
        self.own_bookings(ctx, "read")
    }

    pub fn can_update_booking(&self, ctx: &AccessContext) -> Decision {
        self.own_bookings(ctx, "update")
    }

    pub fn can_delete_booking(&self, ctx: &AccessContext) -> Decision {
        self.own_bookings(ctx, "delete")
    }

    /// Record rule for the booking followed by the rule of `field`
    pub fn can_update_booking_field(&self, ctx: &AccessContext, field: BookingField) -> Decision {
        self.can_update_booking(ctx)
            .and(field.update_rule().decide(ctx, field.name()))
    }

    /// Admins reach every booking, customers their own, nobody else any
    fn own_bookings(&self, ctx: &AccessContext, verb: &str) -> Decision {
        let Some(id) = ctx.user_id() else {
            return Decision::deny(format!("sign in to {} bookings", verb));
        };
        if ctx.is_admin() {
            Decision::Allow
        } else if ctx.has_role(Role::Customer) {
            Decision::allow_if(RecordFilter::equals(fields::CUSTOMER, id))
        } else {
            Decision::deny(format!(
                "guests cannot {} bookings directly; accept an invite instead",
                verb
            ))
        }
    }
}

impl CollectionPolicy for BookingPolicy {
    type Record = BookingRecord;
    const SLUG: &'static str = "bookings";

    fn can_create(&self, ctx: &AccessContext) -> Decision {
        self.can_create_booking(ctx)
    }

    fn can_read(&self, ctx: &AccessContext) -> Decision {
        self.can_read_booking(ctx)
    }

    fn can_update(&self, ctx: &AccessContext) -> Decision {
        self.can_update_booking(ctx)
    }

    fn can_delete(&self, ctx: &AccessContext) -> Decision {
        self.can_delete_booking(ctx)
    }
}
