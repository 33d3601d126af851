//! Access Context
//!
//! Wraps the (possibly absent) principal behind a request. Role-set membership
//! is the only question the policy ever asks of it.

use super::Principal;
use crate::model::UserId;
use staybook_core::Role;
use std::collections::HashMap;

/// Metadata key carrying the id of the request being authorized
pub const REQUEST_ID_KEY: &str = "request_id";

/// Authorization information for a single request
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    /// Authenticated caller (None for anonymous requests)
    pub principal: Option<Principal>,
    /// Additional context metadata
    pub metadata: HashMap<String, String>,
}

impl AccessContext {
    /// Context for an anonymous caller
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated caller
    pub fn user(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            metadata: HashMap::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }

    /// Anonymous callers hold no roles
    pub fn has_role(&self, role: Role) -> bool {
        self.principal.as_ref().is_some_and(|p| p.has_role(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// True when the caller's only role is `guest`
    pub fn is_guest_only(&self) -> bool {
        !self.is_admin() && !self.has_role(Role::Customer) && self.has_role(Role::Guest)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.principal.as_ref().map(Principal::id)
    }

    /// True when the caller is the user `id`
    pub fn is_user(&self, id: &UserId) -> bool {
        self.user_id() == Some(id)
    }

    /// Add metadata to the context
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Get metadata value
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Tag the context with the request it was built for
    pub fn with_request_id(self, request_id: &str) -> Self {
        self.with_metadata(REQUEST_ID_KEY, request_id)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.get_metadata(REQUEST_ID_KEY)
    }

    /// Create a summary string for logging
    pub fn summary(&self) -> String {
        let caller = match &self.principal {
            Some(principal) => format!("user={}, roles={}", principal.id(), principal.roles()),
            None => "anonymous".to_string(),
        };
        match self.request_id() {
            Some(request_id) => format!("AccessContext[{}, request={}]", caller, request_id),
            None => format!("AccessContext[{}]", caller),
        }
    }
}
