//! Staybook Access - access decisions for the booking site
//!
//! Everything that decides who may do what:
//!
//! - Role policy for the Users and Bookings collections, with per-field rules
//! - Write hooks that stamp and validate user drafts
//! - The booking desk: booking creation and guest invites
//! - The route gate that sends visitors to sign in or subscribe
//!
//! ## Architecture
//!
//! Decisions are pure functions over an [`AccessContext`] and record
//! snapshots. Storage and HTTP live in the host application, which asks
//! this crate before it reads or writes.

pub mod auth;
pub mod booking;
pub mod gate;
pub mod hooks;
pub mod model;
pub mod policy;

pub use auth::{AccessContext, Principal, REQUEST_ID_KEY};
pub use booking::{slugify, BookingDesk, BookingRequest, InviteClaims, InviteIssuer};
pub use gate::{
    GateOutcome, GateRequest, RouteGate, StaticSubscriptionSource, SubscriptionSource,
    SubscriptionStatus,
};
pub use hooks::{fill_added_by, prepare_user_create, prepare_user_update};
pub use model::{
    BookingId, BookingPatch, BookingRecord, Operation, PaymentStatus, PostId, UserDraft, UserId,
    UserRecord, WriteOperation,
};
pub use policy::{
    BookingField, BookingPolicy, CollectionPolicy, Decision, FieldRule, FilterTarget,
    RecordFilter, RoleAuthority, UserPolicy,
};
