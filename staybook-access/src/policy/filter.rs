//! Record filters
//!
//! The predicate half of an `AllowIf` decision. The engine never queries
//! storage: it hands back a filter that the caller can evaluate against a
//! snapshot or translate into its own where clause.

use crate::model::{BookingRecord, UserRecord};
use serde::Serialize;
use serde_json::{json, Value};

/// Field names used in filters
pub mod fields {
    pub const ID: &str = "id";
    pub const EMAIL: &str = "email";
    pub const ROLE: &str = "role";
    pub const ADDED_BY: &str = "addedBy";
    pub const CUSTOMER: &str = "customer";
    pub const GUESTS: &str = "guests";
    pub const POST: &str = "post";
    pub const PAYMENT_STATUS: &str = "paymentStatus";
    pub const SLUG: &str = "slug";
}

/// A predicate over the records of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordFilter {
    /// Scalar field equals the value
    Equals { field: &'static str, value: String },
    /// Multi-valued field holds the value
    Contains { field: &'static str, value: String },
    /// At least one branch matches
    Any(Vec<RecordFilter>),
    /// Every branch matches
    All(Vec<RecordFilter>),
}

impl RecordFilter {
    pub fn equals(field: &'static str, value: impl std::fmt::Display) -> Self {
        RecordFilter::Equals {
            field,
            value: value.to_string(),
        }
    }

    pub fn contains(field: &'static str, value: impl std::fmt::Display) -> Self {
        RecordFilter::Contains {
            field,
            value: value.to_string(),
        }
    }

    /// Evaluate the filter against a record snapshot
    pub fn matches<T: FilterTarget + ?Sized>(&self, record: &T) -> bool {
        match self {
            RecordFilter::Equals { field, value } | RecordFilter::Contains { field, value } => {
                record.field_values(field).iter().any(|v| v == value)
            }
            RecordFilter::Any(branches) => branches.iter().any(|f| f.matches(record)),
            RecordFilter::All(branches) => branches.iter().all(|f| f.matches(record)),
        }
    }

    /// Render as a storage-neutral where clause, e.g. `{"customer":{"equals":"u1"}}`
    pub fn to_where(&self) -> Value {
        match self {
            RecordFilter::Equals { field, value } => json!({ *field: { "equals": value } }),
            RecordFilter::Contains { field, value } => json!({ *field: { "contains": value } }),
            RecordFilter::Any(branches) => {
                json!({ "or": branches.iter().map(RecordFilter::to_where).collect::<Vec<_>>() })
            }
            RecordFilter::All(branches) => {
                json!({ "and": branches.iter().map(RecordFilter::to_where).collect::<Vec<_>>() })
            }
        }
    }
}

impl std::fmt::Display for RecordFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFilter::Equals { field, value } => write!(f, "{} = {}", field, value),
            RecordFilter::Contains { field, value } => write!(f, "{} contains {}", field, value),
            RecordFilter::Any(branches) => write_joined(f, branches, "OR"),
            RecordFilter::All(branches) => write_joined(f, branches, "AND"),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    branches: &[RecordFilter],
    op: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", branch)?;
    }
    write!(f, ")")
}

/// Records that filters can be evaluated against
pub trait FilterTarget {
    /// Values stored under `field`; empty when the field is unknown or unset
    fn field_values(&self, field: &str) -> Vec<String>;
}

impl FilterTarget for UserRecord {
    fn field_values(&self, field: &str) -> Vec<String> {
        match field {
            fields::ID => vec![self.id.to_string()],
            fields::EMAIL => vec![self.email.clone()],
            fields::ROLE => self.roles.iter().map(|r| r.to_string()).collect(),
            fields::ADDED_BY => self.added_by.iter().map(|id| id.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

impl FilterTarget for BookingRecord {
    fn field_values(&self, field: &str) -> Vec<String> {
        match field {
            fields::ID => vec![self.id.to_string()],
            fields::CUSTOMER => vec![self.customer.to_string()],
            fields::GUESTS => self.guests.iter().map(|id| id.to_string()).collect(),
            fields::POST => vec![self.post.to_string()],
            fields::PAYMENT_STATUS => vec![self.payment_status.to_string()],
            fields::SLUG => vec![self.slug.clone()],
            _ => Vec::new(),
        }
    }
}
