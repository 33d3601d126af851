//! Access decisions

use super::filter::{FilterTarget, RecordFilter};
use serde::Serialize;
use staybook_core::{permission_denied, StaybookResult};

/// Outcome of a policy question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum Decision {
    /// Permitted for every record
    Allow,
    /// Refused outright
    Deny { reason: String },
    /// Permitted only for records matching the filter
    AllowIf { filter: RecordFilter },
}

impl Decision {
    pub fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny {
            reason: reason.into(),
        }
    }

    pub fn allow_if(filter: RecordFilter) -> Self {
        Decision::AllowIf { filter }
    }

    /// Allow when `condition` holds, otherwise deny with `reason`
    pub fn allow_when(condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::deny(reason)
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    pub fn filter(&self) -> Option<&RecordFilter> {
        match self {
            Decision::AllowIf { filter } => Some(filter),
            _ => None,
        }
    }

    /// Whether the decision admits this particular record
    pub fn permits<T: FilterTarget + ?Sized>(&self, record: &T) -> bool {
        match self {
            Decision::Allow => true,
            Decision::Deny { .. } => false,
            Decision::AllowIf { filter } => filter.matches(record),
        }
    }

    /// Conjunction of two decisions. A denial wins; conditions accumulate.
    pub fn and(self, other: Decision) -> Decision {
        match (self, other) {
            (deny @ Decision::Deny { .. }, _) | (_, deny @ Decision::Deny { .. }) => deny,
            (Decision::Allow, other) | (other, Decision::Allow) => other,
            (Decision::AllowIf { filter: a }, Decision::AllowIf { filter: b }) => {
                Decision::allow_if(RecordFilter::All(vec![a, b]))
            }
        }
    }

    /// Resolve for an operation that has no record to evaluate (e.g. create)
    pub fn check(&self, operation: &str) -> StaybookResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => Err(permission_denied!(reason, "policy", operation)),
            Decision::AllowIf { filter } => Err(permission_denied!(
                format!("{} is only permitted where {}", operation, filter),
                "policy",
                operation
            )),
        }
    }

    /// Resolve against a record snapshot
    pub fn check_record<T: FilterTarget + ?Sized>(
        &self,
        record: &T,
        operation: &str,
    ) -> StaybookResult<()> {
        match self {
            Decision::AllowIf { filter } if !filter.matches(record) => Err(permission_denied!(
                format!("{} is only permitted where {}", operation, filter),
                "policy",
                operation
            )),
            Decision::AllowIf { .. } => Ok(()),
            other => other.check(operation),
        }
    }

    /// Convert into the filter a listing query must apply (`None` = unrestricted)
    pub fn into_filter(self, operation: &str) -> StaybookResult<Option<RecordFilter>> {
        match self {
            Decision::Allow => Ok(None),
            Decision::AllowIf { filter } => Ok(Some(filter)),
            Decision::Deny { reason } => Err(permission_denied!(reason, "policy", operation)),
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny { reason } => write!(f, "deny: {}", reason),
            Decision::AllowIf { filter } => write!(f, "allow if {}", filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::filter::fields;

    #[test]
    fn test_conjunction() {
        let own = Decision::allow_if(RecordFilter::equals(fields::CUSTOMER, "u1"));

        assert_eq!(Decision::Allow.and(own.clone()), own);
        assert!(own.clone().and(Decision::deny("no")).is_deny());
        assert!(Decision::deny("first").and(Decision::Allow).is_deny());

        let both = own.clone().and(Decision::allow_if(RecordFilter::equals(fields::ID, "b1")));
        assert_eq!(
            both.filter(),
            Some(&RecordFilter::All(vec![
                RecordFilter::equals(fields::CUSTOMER, "u1"),
                RecordFilter::equals(fields::ID, "b1"),
            ]))
        );
    }

    #[test]
    fn test_check_without_record() {
        assert!(Decision::Allow.check("create booking").is_ok());
        let err = Decision::deny("admins only").check("delete user").unwrap_err();
        assert!(err.to_string().contains("admins only"));
        assert!(Decision::allow_if(RecordFilter::equals(fields::ID, "u1"))
            .check("update user")
            .is_err());
    }

    #[test]
    fn test_into_filter() {
        assert_eq!(Decision::Allow.into_filter("read").unwrap(), None);
        assert!(Decision::deny("no").into_filter("read").is_err());
        let filter = RecordFilter::equals(fields::CUSTOMER, "u1");
        assert_eq!(
            Decision::allow_if(filter.clone()).into_filter("read").unwrap(),
            Some(filter)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Decision::deny("nope")).unwrap();
        assert_eq!(json["decision"], "deny");
        assert_eq!(json["reason"], "nope");

        let json = serde_json::to_value(Decision::allow_if(RecordFilter::equals(
            fields::CUSTOMER,
            "u1",
        )))
        .unwrap();
        assert_eq!(json["decision"], "allowIf");
        assert_eq!(json["filter"]["equals"]["field"], "customer");
    }
}
