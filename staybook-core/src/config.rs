//! Configuration management

use crate::error::{ErrorContext, StaybookError, StaybookResult};
use crate::types::{AccessConfig, InviteConfig, StaybookConfig};

use std::path::Path;

/// Environment variable that overrides `invite.secret`
pub const INVITE_SECRET_ENV: &str = "STAYBOOK_INVITE_SECRET";

/// Longest invite lifetime accepted by `validate` (one year)
pub const MAX_INVITE_TTL_HOURS: i64 = 24 * 365;

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/login".to_string(),
                "/subscribe".to_string(),
                "/register".to_string(),
            ],
            protected_prefixes: vec!["/admin".to_string(), "/join".to_string()],
            admin_prefix: "/admin".to_string(),
            admin_entitlement: "subscription_pro".to_string(),
            login_path: "/login".to_string(),
            subscribe_path: "/subscribe".to_string(),
            admin_fallback_path: "/bookings".to_string(),
            auth_cookie: "payload-token".to_string(),
            customer_cookie: "rc-customer-id".to_string(),
        }
    }
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            secret: "staybook-default-invite-secret-change-in-production".to_string(),
            ttl_hours: 24 * 7,
            base_url: "http://localhost:3000".to_string(),
            accept_path: "/guest/invite".to_string(),
        }
    }
}

impl StaybookConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> StaybookResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StaybookError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: StaybookConfig = toml::from_str(&content).map_err(|e| StaybookError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> StaybookResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| StaybookError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| StaybookError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(INVITE_SECRET_ENV) {
            if !secret.is_empty() {
                self.invite.secret = secret;
            }
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> StaybookResult<()> {
        let access = &self.access;
        let paths = access
            .public_paths
            .iter()
            .chain(access.protected_prefixes.iter())
            .chain([
                &access.admin_prefix,
                &access.login_path,
                &access.subscribe_path,
                &access.admin_fallback_path,
                &self.invite.accept_path,
            ]);
        for path in paths {
            if !path.starts_with('/') {
                return Err(invalid(
                    format!("Path '{}' must start with '/'", path),
                    "Use absolute paths such as /login",
                ));
            }
        }

        if !access.protected_prefixes.contains(&access.admin_prefix) {
            return Err(invalid(
                format!(
                    "admin_prefix '{}' is not one of the protected prefixes",
                    access.admin_prefix
                ),
                "Add access.admin_prefix to access.protected_prefixes",
            ));
        }

        if access.admin_entitlement.trim().is_empty() {
            return Err(invalid(
                "access.admin_entitlement must not be empty".to_string(),
                "Set the entitlement that unlocks the admin area",
            ));
        }

        if self.invite.secret.is_empty() {
            return Err(invalid(
                "invite.secret must not be empty".to_string(),
                "Set invite.secret or STAYBOOK_INVITE_SECRET",
            ));
        }

        if !(1..=MAX_INVITE_TTL_HOURS).contains(&self.invite.ttl_hours) {
            return Err(invalid(
                format!(
                    "invite.ttl_hours must be between 1 and {}, got {}",
                    MAX_INVITE_TTL_HOURS, self.invite.ttl_hours
                ),
                "Set invite.ttl_hours to at most a year",
            ));
        }

        Ok(())
    }
}

fn invalid(message: String, suggestion: &str) -> StaybookError {
    StaybookError::Config {
        message,
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        StaybookConfig::default().validate().unwrap();
    }

    #[test]
    fn test_relative_path_rejected() {
        let mut config = StaybookConfig::default();
        config.access.public_paths.push("login".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_admin_prefix_must_be_protected() {
        let mut config = StaybookConfig::default();
        config.access.protected_prefixes = vec!["/join".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = StaybookConfig::default();
        config.invite.ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let mut config = StaybookConfig::default();
        config.invite.ttl_hours = MAX_INVITE_TTL_HOURS;
        config.validate().unwrap();

        config.invite.ttl_hours = 3_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invite.ttl_hours"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: StaybookConfig = toml::from_str(
            r#"
            [invite]
            ttl_hours = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.invite.ttl_hours, 12);
        assert_eq!(config.invite.accept_path, "/guest/invite");
        assert_eq!(config.access.admin_entitlement, "subscription_pro");
    }
}
