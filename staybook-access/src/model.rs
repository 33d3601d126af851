//! Records of the Users and Bookings collections

use crate::booking::slugify;
use crate::policy::BookingField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staybook_core::RoleSet;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a user account
    UserId
);
id_type!(
    /// Identifier of a booking
    BookingId
);
id_type!(
    /// Identifier of a bookable listing (post)
    PostId
);

/// Stored user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub roles: RoleSet,
    /// Admin or customer that provisioned this account
    pub added_by: Option<UserId>,
}

/// Incoming user data for a create or update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `None` leaves roles untouched (or defaulted on create)
    pub roles: Option<RoleSet>,
    pub added_by: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Unpaid => write!(f, "unpaid"),
        }
    }
}

/// Stored booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    pub title: String,
    /// Owning customer
    pub customer: UserId,
    pub guests: Vec<UserId>,
    pub post: PostId,
    pub payment_status: PaymentStatus,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub slug: String,
    /// When set, the slug is regenerated from the title
    pub slug_lock: bool,
    pub invite_token: String,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn has_guest(&self, user: &UserId) -> bool {
        self.guests.contains(user)
    }

    /// Fields whose value in `updated` differs from this record
    pub fn changed_fields(&self, updated: &BookingRecord) -> Vec<BookingField> {
        let checks = [
            (BookingField::Title, self.title != updated.title),
            (BookingField::Customer, self.customer != updated.customer),
            (BookingField::Guests, self.guests != updated.guests),
            (BookingField::Post, self.post != updated.post),
            (
                BookingField::PaymentStatus,
                self.payment_status != updated.payment_status,
            ),
            (BookingField::FromDate, self.from_date != updated.from_date),
            (BookingField::ToDate, self.to_date != updated.to_date),
            (BookingField::Slug, self.slug != updated.slug),
            (BookingField::SlugLock, self.slug_lock != updated.slug_lock),
        ];
        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

/// Proposed changes to a booking; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub title: Option<String>,
    pub customer: Option<UserId>,
    pub guests: Option<Vec<UserId>>,
    pub post: Option<PostId>,
    pub payment_status: Option<PaymentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub slug: Option<String>,
    pub slug_lock: Option<bool>,
}

impl BookingPatch {
    /// Apply the patch.
    ///
    /// A locked slug is regenerated only when the patch renames the booking
    /// or turns the lock on. An explicit `slug` in the patch otherwise wins,
    /// and a patch touching neither leaves the stored slug alone.
    pub fn apply(self, mut booking: BookingRecord) -> BookingRecord {
        let retitled = self
            .title
            .as_ref()
            .is_some_and(|title| *title != booking.title);
        let locked = self.slug_lock == Some(true) && !booking.slug_lock;

        if let Some(title) = self.title {
            booking.title = title;
        }
        if let Some(customer) = self.customer {
            booking.customer = customer;
        }
        if let Some(guests) = self.guests {
            booking.guests = guests;
        }
        if let Some(post) = self.post {
            booking.post = post;
        }
        if let Some(status) = self.payment_status {
            booking.payment_status = status;
        }
        if let Some(from_date) = self.from_date {
            booking.from_date = from_date;
        }
        if let Some(to_date) = self.to_date {
            booking.to_date = to_date;
        }
        if let Some(slug_lock) = self.slug_lock {
            booking.slug_lock = slug_lock;
        }
        if let Some(slug) = self.slug {
            booking.slug = slug;
        }
        if booking.slug_lock && (retitled || locked) {
            booking.slug = slugify(&booking.title);
        }
        booking
    }
}

/// Record-level operations a collection guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Operations that write a user's `role` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    Create,
    Update,
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOperation::Create => write!(f, "create"),
            WriteOperation::Update => write!(f, "update"),
        }
    }
}

impl std::str::FromStr for WriteOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(WriteOperation::Create),
            "update" => Ok(WriteOperation::Update),
            _ => Err(format!("Unknown write operation: {}", s)),
        }
    }
}
