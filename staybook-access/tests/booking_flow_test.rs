//! Booking creation, invites and the route gate end to end

use chrono::{Duration, TimeZone, Utc};
use staybook_access::{
    prepare_user_create, AccessContext, BookingDesk, BookingRequest, GateOutcome, GateRequest,
    PaymentStatus, Principal, RouteGate, StaticSubscriptionSource, SubscriptionStatus, UserDraft,
    UserId, UserRecord,
};
use staybook_core::{AccessConfig, InviteConfig, Role, RoleSet, StaybookError};

fn desk() -> BookingDesk {
    BookingDesk::new(&InviteConfig {
        secret: "integration-secret".to_string(),
        ..InviteConfig::default()
    })
}

fn customer(id: &str, name: Option<&str>) -> UserRecord {
    UserRecord {
        id: id.into(),
        name: name.map(str::to_string),
        email: format!("{}@example.com", id),
        roles: RoleSet::only(Role::Customer),
        added_by: None,
    }
}

fn request(now: chrono::DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        post_id: "lake-house".into(),
        from_date: Some(now),
        to_date: Some(now),
        duration_days: 3,
    }
}

#[test]
fn test_customer_books_and_invites_a_guest() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let desk = desk();
    let now = Utc::now();
    let ada = customer("c1", Some("Ada"));
    let owner = AccessContext::user(Principal::customer("c1"));

    let booking = desk
        .create_booking(&owner, &ada, request(now), now)
        .unwrap();
    assert_eq!(booking.customer, ada.id);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.to_date - booking.from_date, Duration::days(3));
    assert!(booking.title.starts_with("Booking for Ada - "));
    assert!(booking.slug.starts_with("booking-for-ada---"));

    let claims = desk.invites().verify(&booking.invite_token).unwrap();
    assert_eq!(claims.booking_id, booking.id);
    assert_eq!(claims.inviter, ada.id);

    let url = desk.invite_url(&owner, &booking).unwrap();
    assert!(url.ends_with(&format!("/guest/invite?token={}", booking.invite_token)));

    // A visitor registers and redeems the invite
    let draft = prepare_user_create(
        desk.authority(),
        &AccessContext::anonymous(),
        UserDraft {
            email: Some("grace@example.com".to_string()),
            ..UserDraft::default()
        },
    )
    .unwrap();
    assert_eq!(draft.roles, Some(RoleSet::only(Role::Guest)));

    let grace = AccessContext::user(Principal::guest("g1"));
    let joined = desk
        .accept_invite(&grace, &booking, &booking.invite_token)
        .unwrap();
    assert_eq!(joined.guests, vec![UserId::from("g1")]);

    let again = desk
        .accept_invite(&grace, &joined, &joined.invite_token)
        .unwrap();
    assert_eq!(again.guests.len(), 1);
}

#[test]
fn test_title_falls_back_to_email() {
    let desk = desk();
    let now = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
    let admin = AccessContext::user(Principal::admin("a1"));

    let booking = desk
        .create_booking(&admin, &customer("c2", None), request(now), now)
        .unwrap();
    assert_eq!(booking.title, "Booking for c2@example.com - 7/1/2026");
    assert_eq!(booking.slug, "booking-for-c2examplecom---712026");
}

#[test]
fn test_booking_creation_is_guarded() {
    let desk = desk();
    let now = Utc::now();
    let bob = customer("c2", Some("Bob"));

    let err = desk
        .create_booking(
            &AccessContext::user(Principal::customer("c1")),
            &bob,
            request(now),
            now,
        )
        .unwrap_err();
    assert!(matches!(err, StaybookError::PermissionDenied { .. }));

    for ctx in [
        AccessContext::anonymous(),
        AccessContext::user(Principal::guest("g1")),
    ] {
        assert!(desk.create_booking(&ctx, &bob, request(now), now).is_err());
    }

    let mut backwards = request(now);
    backwards.to_date = Some(now - Duration::days(10));
    let err = desk
        .create_booking(
            &AccessContext::user(Principal::customer("c2")),
            &bob,
            backwards,
            now,
        )
        .unwrap_err();
    assert!(matches!(err, StaybookError::Validation { .. }));
}

#[test]
fn test_oversized_stay_is_rejected() {
    let desk = desk();
    let now = Utc::now();
    let bob = customer("c2", Some("Bob"));
    let ctx = AccessContext::user(Principal::customer("c2"));

    let mut endless = request(now);
    endless.duration_days = u32::MAX;
    let err = desk.create_booking(&ctx, &bob, endless, now).unwrap_err();
    match err {
        StaybookError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("duration")),
        other => panic!("expected a validation error, got {:?}", other),
    }

    // A long but representable stay is still accepted
    let mut long = request(now);
    long.duration_days = 365;
    let booking = desk.create_booking(&ctx, &bob, long, now).unwrap();
    assert_eq!(booking.to_date - booking.from_date, Duration::days(365));
}

#[test]
fn test_invite_rejections() {
    let desk = desk();
    let now = Utc::now();
    let owner = AccessContext::user(Principal::customer("c1"));
    let guest = AccessContext::user(Principal::guest("g1"));
    let ada = customer("c1", Some("Ada"));

    let first = desk.create_booking(&owner, &ada, request(now), now).unwrap();
    let second = desk.create_booking(&owner, &ada, request(now), now).unwrap();

    // Anonymous callers must sign in first
    let err = desk
        .accept_invite(&AccessContext::anonymous(), &first, &first.invite_token)
        .unwrap_err();
    assert!(matches!(err, StaybookError::PermissionDenied { .. }));

    // Token of another booking
    let err = desk
        .accept_invite(&guest, &first, &second.invite_token)
        .unwrap_err();
    assert!(matches!(err, StaybookError::InvalidToken { .. }));

    // Owner cannot join their own booking
    let err = desk
        .accept_invite(&owner, &first, &first.invite_token)
        .unwrap_err();
    assert!(matches!(err, StaybookError::Validation { .. }));

    // Rotation retires the old link
    let rotated = desk.rotate_invite(&owner, &first, now).unwrap();
    assert_ne!(rotated.invite_token, first.invite_token);
    assert!(desk
        .accept_invite(&guest, &rotated, &first.invite_token)
        .is_err());
    assert!(desk
        .accept_invite(&guest, &rotated, &rotated.invite_token)
        .is_ok());

    // Only the owner or an admin may rotate or share
    assert!(desk.rotate_invite(&guest, &first, now).is_err());
    assert!(desk
        .invite_url(&AccessContext::user(Principal::customer("c9")), &first)
        .is_err());
}

#[test]
fn test_gate_admits_subscribed_customer() {
    let status = SubscriptionStatus {
        has_active_subscription: true,
        customer_id: Some("cus_42".to_string()),
        active_entitlements: vec!["subscription_pro".to_string()],
    };
    let gate = RouteGate::new(AccessConfig::default(), StaticSubscriptionSource::new(status));

    assert_eq!(
        gate.evaluate(&GateRequest::new("/admin")),
        GateOutcome::Redirect {
            location: "/login".to_string()
        }
    );
    assert_eq!(
        gate.evaluate(&GateRequest::new("/admin").with_auth_token("jwt")),
        GateOutcome::NextWithCustomerCookie {
            customer_id: "cus_42".to_string()
        }
    );

    let outcome = serde_json::to_value(
        gate.evaluate(&GateRequest::new("/register").with_auth_token("jwt")),
    )
    .unwrap();
    assert_eq!(outcome, serde_json::json!({ "outcome": "next" }));
}
