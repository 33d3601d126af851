//! Field-level rules
//!
//! A field rule is layered on top of the record rule that admitted the
//! operation: a field write goes through only when both allow it.

use super::filter::{fields, RecordFilter};
use super::Decision;
use crate::auth::AccessContext;
use serde::{Deserialize, Serialize};

/// Update rule attached to a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    AdminOnly,
    /// Admins, or the user referenced by the record's `relation` field
    AdminOrSelf { relation: &'static str },
}

impl FieldRule {
    pub fn decide(&self, ctx: &AccessContext, field: &str) -> Decision {
        if ctx.is_admin() {
            return Decision::Allow;
        }
        match (self, ctx.user_id()) {
            (FieldRule::AdminOnly, _) => {
                Decision::deny(format!("only admins can change '{}'", field))
            }
            (FieldRule::AdminOrSelf { relation }, Some(id)) => {
                Decision::allow_if(RecordFilter::equals(*relation, id))
            }
            (FieldRule::AdminOrSelf { .. }, None) => {
                Decision::deny(format!("sign in to change '{}'", field))
            }
        }
    }
}

/// Fields of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookingField {
    Title,
    Customer,
    Guests,
    Slug,
    SlugLock,
    Post,
    PaymentStatus,
    FromDate,
    ToDate,
}

impl BookingField {
    pub const ALL: [BookingField; 9] = [
        BookingField::Title,
        BookingField::Customer,
        BookingField::Guests,
        BookingField::Slug,
        BookingField::SlugLock,
        BookingField::Post,
        BookingField::PaymentStatus,
        BookingField::FromDate,
        BookingField::ToDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BookingField::Title => "title",
            BookingField::Customer => "customer",
            BookingField::Guests => "guests",
            BookingField::Slug => "slug",
            BookingField::SlugLock => "slugLock",
            BookingField::Post => "post",
            BookingField::PaymentStatus => "paymentStatus",
            BookingField::FromDate => "fromDate",
            BookingField::ToDate => "toDate",
        }
    }

    /// Only the guest list is open to the booking's own customer
    pub fn update_rule(&self) -> FieldRule {
        match self {
            BookingField::Guests => FieldRule::AdminOrSelf {
                relation: fields::CUSTOMER,
            },
            _ => FieldRule::AdminOnly,
        }
    }
}

impl std::fmt::Display for BookingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
