//! Booking desk
//!
//! Creates bookings for paying customers and runs the guest invite flow:
//! every booking carries an invite token from creation, and a signed-in
//! user who presents it is added to the guest list.

pub mod invite;

pub use invite::{InviteClaims, InviteIssuer};

use crate::auth::AccessContext;
use crate::model::{BookingId, BookingRecord, PaymentStatus, PostId, UserRecord};
use crate::policy::{BookingField, RoleAuthority};
use chrono::{DateTime, TimeDelta, Utc};
use invite::invalid_token;
use regex::Regex;
use serde::{Deserialize, Serialize};
use staybook_core::{
    log_operation_start, log_operation_success, permission_denied, validation_error,
    InviteConfig, StaybookResult,
};
use std::sync::LazyLock;
use tracing::info;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static slug pattern"));

/// Turn a title into a URL slug: spaces become dashes, other punctuation is dropped
pub fn slugify(title: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&title.replace(' ', "-"), "")
        .to_lowercase()
}

/// Checkout payload for a new booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub post_id: PostId,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Nights added on top of `to_date`
    pub duration_days: u32,
}

/// Booking workflow on top of the access policy
pub struct BookingDesk {
    authority: RoleAuthority,
    invites: InviteIssuer,
}

impl BookingDesk {
    pub fn new(config: &InviteConfig) -> Self {
        Self {
            authority: RoleAuthority::new(),
            invites: InviteIssuer::new(config),
        }
    }

    pub fn authority(&self) -> &RoleAuthority {
        &self.authority
    }

    pub fn invites(&self) -> &InviteIssuer {
        &self.invites
    }

    /// Create a paid booking for `customer`. Customers may only book for themselves.
    pub fn create_booking(
        &self,
        ctx: &AccessContext,
        customer: &UserRecord,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> StaybookResult<BookingRecord> {
        self.authority
            .can_create_booking(ctx)
            .check("create bookings")?;

        if !ctx.is_admin() && !ctx.is_user(&customer.id) {
            return Err(permission_denied!(
                "customers can only create bookings for themselves",
                "booking_desk",
                "create_booking"
            ));
        }

        if request.post_id.as_str().trim().is_empty() {
            return Err(validation_error!(
                "a booking must reference a listing",
                "post",
                "booking_desk"
            ));
        }

        let from_date = request.from_date.unwrap_or(now);
        let to_date = TimeDelta::try_days(i64::from(request.duration_days))
            .and_then(|stay| request.to_date.unwrap_or(now).checked_add_signed(stay))
            .ok_or_else(|| {
                validation_error!("stay duration is out of range", "duration", "booking_desk")
            })?;
        if to_date < from_date {
            return Err(validation_error!(
                "check-out date is before check-in date",
                "toDate",
                "booking_desk"
            ));
        }

        log_operation_start!("create_booking", customer = %customer.id, post = %request.post_id);

        let id = BookingId::generate();
        let title = format!(
            "Booking for {} - {}",
            customer.name.as_deref().unwrap_or(&customer.email),
            from_date.format("%-m/%-d/%Y")
        );
        let inviter = ctx.user_id().unwrap_or(&customer.id);
        let invite_token = self.invites.issue(&id, inviter, now)?;

        let booking = BookingRecord {
            slug: slugify(&title),
            id,
            title,
            customer: customer.id.clone(),
            guests: Vec::new(),
            post: request.post_id,
            // Bookings are recorded once checkout has succeeded
            payment_status: PaymentStatus::Paid,
            from_date,
            to_date,
            slug_lock: true,
            invite_token,
            created_at: now,
        };

        log_operation_success!("create_booking", booking = %booking.id);
        Ok(booking)
    }

    /// Add the caller to the guest list of `booking`.
    ///
    /// Redemption is authorized by the token alone, not by the booking policy.
    pub fn accept_invite(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
        token: &str,
    ) -> StaybookResult<BookingRecord> {
        let Some(guest) = ctx.user_id() else {
            return Err(permission_denied!(
                "sign in or register to accept an invite",
                "booking_desk",
                "accept_invite"
            ));
        };

        let claims = self.invites.verify(token)?;
        if claims.booking_id != booking.id {
            return Err(invalid_token("invite belongs to a different booking"));
        }
        if token != booking.invite_token {
            return Err(invalid_token("invite has been replaced by a newer link"));
        }

        if *guest == booking.customer {
            return Err(validation_error!(
                "the booking owner cannot join as a guest",
                "guests",
                "booking_desk"
            ));
        }

        if booking.has_guest(guest) {
            info!(booking = %booking.id, guest = %guest, "Guest already on booking");
            return Ok(booking.clone());
        }

        let mut updated = booking.clone();
        updated.guests.push(guest.clone());
        info!(booking = %booking.id, guest = %guest, "Guest accepted invite");
        Ok(updated)
    }

    /// Replace the invite token; earlier links stop working
    pub fn rotate_invite(
        &self,
        ctx: &AccessContext,
        booking: &BookingRecord,
        now: DateTime<Utc>,
    ) -> StaybookResult<BookingRecord> {
        self.authority
            .can_update_booking_field(ctx, BookingField::Guests)
            .check_record(booking, "rotate booking invite")?;

        let inviter = ctx.user_id().unwrap_or(&booking.customer);
        let mut updated = booking.clone();
        updated.invite_token = self.invites.issue(&booking.id, inviter, now)?;
        info!(booking = %booking.id, "Invite token rotated");
        Ok(updated)
    }

    /// Shareable link for the booking's current invite
    pub fn invite_url(&self, ctx: &AccessContext, booking: &BookingRecord) -> StaybookResult<String> {
        self.authority
            .can_update_booking_field(ctx, BookingField::Guests)
            .check_record(booking, "share booking invite")?;
        Ok(self.invites.invite_url(&booking.invite_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Lake house"), "lake-house");
        assert_eq!(
            slugify("Booking for Ada - 7/1/2026"),
            "booking-for-ada---712026"
        );
        assert_eq!(slugify("Ünïcode & co"), "ncode--co");
    }
}
