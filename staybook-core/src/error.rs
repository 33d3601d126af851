//! Error handling
//!
//! One error enum for the workspace. Every domain variant carries an
//! [`ErrorContext`] so a rejection can be traced back to the component and
//! operation that produced it. Policy rejections are terminal: they are
//! surfaced to the caller and never retried.

use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

pub type StaybookResult<T> = Result<T, StaybookError>;

/// Where and when an error was raised, plus hints for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// e.g. `user_policy`, `booking_desk`, `invite`
    pub component: String,
    pub operation: Option<String>,
    pub metadata: HashMap<String, String>,
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

#[derive(Error, Debug)]
pub enum StaybookError {
    #[error("Permission denied: {reason}")]
    PermissionDenied {
        reason: String,
        context: ErrorContext,
    },

    #[error("Role escalation rejected ({role}): {message}")]
    RoleEscalation {
        role: Role,
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Invalid invite token: {message}")]
    InvalidToken {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Upstream service error ({service}): {message}")]
    Upstream {
        service: String,
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl StaybookError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            StaybookError::PermissionDenied { context, .. } => Some(context),
            StaybookError::RoleEscalation { context, .. } => Some(context),
            StaybookError::Validation { context, .. } => Some(context),
            StaybookError::InvalidToken { context, .. } => Some(context),
            StaybookError::NotFound { context, .. } => Some(context),
            StaybookError::Config { context, .. } => Some(context),
            StaybookError::Upstream { context, .. } => Some(context),
            StaybookError::Internal { context, .. } => Some(context),
            StaybookError::Io(_) | StaybookError::Serialization(_) => None,
        }
    }

    /// Policy and validation failures are final; only upstream outages are worth retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StaybookError::Upstream { .. })
    }

    /// True for the two policy rejection kinds
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            StaybookError::PermissionDenied { .. } | StaybookError::RoleEscalation { .. }
        )
    }

    /// Suggested HTTP status for callers that translate errors into responses
    pub fn http_status(&self) -> u16 {
        match self {
            StaybookError::PermissionDenied { .. } | StaybookError::RoleEscalation { .. } => 403,
            StaybookError::InvalidToken { .. } => 401,
            StaybookError::Validation { .. } => 400,
            StaybookError::NotFound { .. } => 404,
            StaybookError::Upstream { .. } => 502,
            _ => 500,
        }
    }

    /// Log at a level matching the error kind
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            StaybookError::PermissionDenied { .. }
            | StaybookError::RoleEscalation { .. }
            | StaybookError::InvalidToken { .. } => {
                debug!(error_id = ?error_id, error = %self, "Request rejected by policy");
            }
            StaybookError::Validation { .. } | StaybookError::NotFound { .. } => {
                warn!(error_id = ?error_id, error = %self, "Rejected malformed request");
            }
            StaybookError::Upstream { .. } => {
                warn!(error_id = ?error_id, error = %self, "Upstream error (may be recoverable)");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Unexpected failure");
            }
        }
    }
}

// Constructors that fill in the context

#[macro_export]
macro_rules! permission_denied {
    ($reason:expr, $component:expr) => {
        $crate::StaybookError::PermissionDenied {
            reason: $reason.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
    ($reason:expr, $component:expr, $operation:expr) => {
        $crate::StaybookError::PermissionDenied {
            reason: $reason.to_string(),
            context: $crate::ErrorContext::new($component).with_operation($operation),
        }
    };
}

#[macro_export]
macro_rules! role_escalation {
    ($role:expr, $msg:expr, $component:expr) => {
        $crate::StaybookError::RoleEscalation {
            role: $role,
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_metadata("role", $role.as_str())
                .with_suggestion("Ask an administrator to assign this role"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::StaybookError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'staybook config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::StaybookError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::StaybookError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the identifier"),
        }
    };
}
