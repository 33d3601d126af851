//! Route gate
//!
//! Decides, per request path, whether the caller goes through, is sent to
//! sign in or is sent to subscribe. Subscription state comes from an
//! external billing provider behind [`SubscriptionSource`].

use serde::{Deserialize, Serialize};
use staybook_core::{AccessConfig, ErrorContext, StaybookError, StaybookResult};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The parts of an incoming request the gate looks at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateRequest {
    pub path: String,
    pub auth_token: Option<String>,
    pub customer_cookie: Option<String>,
}

impl GateRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_customer_cookie(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_cookie = Some(customer_id.into());
        self
    }

    fn has_auth_token(&self) -> bool {
        self.auth_token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

/// Billing state of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub has_active_subscription: bool,
    pub customer_id: Option<String>,
    #[serde(default)]
    pub active_entitlements: Vec<String>,
}

impl SubscriptionStatus {
    /// Without an entitlement, any active subscription counts
    pub fn is_subscribed(&self, entitlement: Option<&str>) -> bool {
        match entitlement {
            Some(name) => self.active_entitlements.iter().any(|e| e == name),
            None => self.has_active_subscription,
        }
    }
}

/// Looks up the subscription of the caller behind a request
pub trait SubscriptionSource {
    fn lookup(&self, request: &GateRequest) -> StaybookResult<SubscriptionStatus>;
}

/// Fixed answer, for tests and the CLI
#[derive(Debug, Clone)]
pub struct StaticSubscriptionSource {
    answer: Result<SubscriptionStatus, String>,
}

impl StaticSubscriptionSource {
    pub fn new(status: SubscriptionStatus) -> Self {
        Self { answer: Ok(status) }
    }

    /// A source whose every lookup fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
        }
    }
}

impl SubscriptionSource for StaticSubscriptionSource {
    fn lookup(&self, _request: &GateRequest) -> StaybookResult<SubscriptionStatus> {
        self.answer
            .clone()
            .map_err(|message| StaybookError::Upstream {
                service: "billing".to_string(),
                message,
                context: ErrorContext::new("subscription_source").with_operation("lookup"),
            })
    }
}

/// What the caller should do with the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GateOutcome {
    Next,
    Redirect { location: String },
    /// Continue, and remember the billing customer id in a cookie
    #[serde(rename_all = "camelCase")]
    NextWithCustomerCookie { customer_id: String },
}

impl GateOutcome {
    fn redirect(location: &str) -> Self {
        GateOutcome::Redirect {
            location: location.to_string(),
        }
    }
}

pub struct RouteGate<S> {
    config: AccessConfig,
    subscriptions: S,
}

impl<S: SubscriptionSource> RouteGate<S> {
    pub fn new(config: AccessConfig, subscriptions: S) -> Self {
        Self {
            config,
            subscriptions,
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Build a request from raw cookies using the configured cookie names
    pub fn request_from_cookies(
        &self,
        path: impl Into<String>,
        cookies: &HashMap<String, String>,
    ) -> GateRequest {
        GateRequest {
            path: path.into(),
            auth_token: cookies.get(&self.config.auth_cookie).cloned(),
            customer_cookie: cookies.get(&self.config.customer_cookie).cloned(),
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.config.public_paths.iter().any(|p| p == path)
    }

    fn is_protected(&self, path: &str) -> bool {
        self.config
            .protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn evaluate(&self, request: &GateRequest) -> GateOutcome {
        let path = request.path.as_str();

        if self.is_public(path) || !self.is_protected(path) {
            debug!(path = %path, "Path is not gated");
            return GateOutcome::Next;
        }

        if !request.has_auth_token() {
            info!(path = %path, "No auth token, redirecting to login");
            return GateOutcome::redirect(&self.config.login_path);
        }

        let status = match self.subscriptions.lookup(request) {
            Ok(status) => status,
            Err(e) => {
                warn!(path = %path, error = %e, "Subscription lookup failed");
                return GateOutcome::redirect(&self.config.subscribe_path);
            }
        };

        if path.starts_with(self.config.admin_prefix.as_str()) {
            if !status.is_subscribed(Some(&self.config.admin_entitlement)) {
                info!(
                    path = %path,
                    entitlement = %self.config.admin_entitlement,
                    "Missing admin entitlement"
                );
                return GateOutcome::redirect(&self.config.admin_fallback_path);
            }
        } else if !status.is_subscribed(None) {
            info!(path = %path, "No active subscription, redirecting to subscribe");
            return GateOutcome::redirect(&self.config.subscribe_path);
        }

        match status.customer_id.filter(|id| !id.is_empty()) {
            Some(customer_id) if request.customer_cookie.is_none() => {
                GateOutcome::NextWithCustomerCookie { customer_id }
            }
            _ => GateOutcome::Next,
        }
    }
}
