//! Staybook CLI - Command-line interface for Staybook access decisions
//!
//! Lets operators check route gating, role assignments and invite tokens
//! against a configuration without running the site.

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use staybook_access::{
    AccessContext, GateRequest, InviteIssuer, Principal, RoleAuthority, RouteGate,
    StaticSubscriptionSource, SubscriptionStatus, WriteOperation,
};
use staybook_core::{
    config_error, init_logging, log_operation_error, log_operation_start, log_operation_success,
    not_found_error, ErrorContext, LoggingConfig, RoleSet, StaybookConfig, StaybookError,
    StaybookResult, INVITE_SECRET_ENV,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "staybook")]
#[command(about = "Access decisions for the Staybook booking site")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the route gate for a request path
    Gate {
        /// Request path, e.g. /admin/collections
        path: String,

        /// Value of the auth cookie
        #[arg(long)]
        token: Option<String>,

        /// Value of the customer id cookie
        #[arg(long)]
        customer_cookie: Option<String>,

        /// Treat the caller as having an active subscription
        #[arg(long)]
        subscribed: bool,

        /// Active entitlements (repeatable)
        #[arg(long = "entitlement")]
        entitlements: Vec<String>,

        /// Billing customer id returned by the subscription lookup
        #[arg(long)]
        customer_id: Option<String>,

        /// Make the subscription lookup fail with this message
        #[arg(long)]
        lookup_error: Option<String>,
    },

    /// Check a role assignment
    Roles {
        /// Roles of the acting user, comma separated; omit for an anonymous caller
        #[arg(long)]
        actor: Option<RoleSet>,

        /// Id of the acting user
        #[arg(long, default_value = "cli-user")]
        actor_id: String,

        /// Write operation (create or update)
        #[arg(long, default_value = "create")]
        operation: WriteOperation,

        /// Proposed roles, comma separated
        #[arg(long)]
        proposed: Option<RoleSet>,

        /// Current roles of the target account (updates only)
        #[arg(long)]
        original: Option<RoleSet>,
    },

    /// Issue or verify booking invite tokens
    Invite {
        #[command(subcommand)]
        action: InviteAction,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum InviteAction {
    /// Sign a new invite for a booking
    Issue {
        /// Booking id
        booking: String,

        /// Id of the inviting user
        #[arg(long, default_value = "cli-user")]
        inviter: String,
    },

    /// Check an invite token and print its claims
    Verify {
        token: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = logging_settings(cli.config.as_ref(), cli.verbose);
    init_logging(&logging_config).map_err(|e| StaybookError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    info!("Starting Staybook CLI v{}", env!("CARGO_PKG_VERSION"));

    let result = run(cli.command, cli.config.as_ref());
    if let Err(e) = &result {
        e.log();
    }
    Ok(result?)
}

fn run(command: Commands, config_path: Option<&PathBuf>) -> StaybookResult<()> {
    match command {
        Commands::Gate {
            path,
            token,
            customer_cookie,
            subscribed,
            entitlements,
            customer_id,
            lookup_error,
        } => {
            let request = GateRequest {
                path,
                auth_token: token,
                customer_cookie,
            };
            let source = match lookup_error {
                Some(message) => StaticSubscriptionSource::failing(message),
                None => StaticSubscriptionSource::new(SubscriptionStatus {
                    has_active_subscription: subscribed,
                    customer_id,
                    active_entitlements: entitlements,
                }),
            };
            let gate = RouteGate::new(load_config(config_path)?.access, source);
            print_json(&gate.evaluate(&request))
        }
        Commands::Roles {
            actor,
            actor_id,
            operation,
            proposed,
            original,
        } => print_json(&handle_roles(
            actor, actor_id, operation, proposed, original,
        )?),
        Commands::Invite { action } => handle_invite(action, &load_config(config_path)?),
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(config_path, show, init, validate),
    }
}

/// Logging section of the config file, or defaults when it cannot be read
fn logging_settings(config_path: Option<&PathBuf>, verbose: bool) -> LoggingConfig {
    let logging = read_config(config_path)
        .map(|config| config.logging)
        .unwrap_or_default();
    if verbose {
        logging.verbose()
    } else {
        logging
    }
}

/// Configuration for commands that act on it
fn load_config(config_path: Option<&PathBuf>) -> StaybookResult<StaybookConfig> {
    let config = read_config(config_path)?;
    config.validate()?;
    Ok(config)
}

fn read_config(config_path: Option<&PathBuf>) -> StaybookResult<StaybookConfig> {
    let config = if let Some(path) = config_path {
        if !path.exists() {
            return Err(not_found_error!(
                format!("config file {}", path.display()),
                "cli"
            ));
        }
        info!("Loading configuration from {:?}", path);
        StaybookConfig::from_file(path)?
    } else {
        let default_paths = [
            dirs::config_dir().map(|d| d.join("staybook").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".staybook").join("config.toml")),
            Some(PathBuf::from("staybook.toml")),
        ];

        match default_paths.into_iter().flatten().find(|path| path.exists()) {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                StaybookConfig::from_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                StaybookConfig::default()
            }
        }
    };

    Ok(config.apply_env_overrides())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleCheckReport {
    actor: String,
    operation: WriteOperation,
    allowed: bool,
    stored_roles: Option<RoleSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn handle_roles(
    actor: Option<RoleSet>,
    actor_id: String,
    operation: WriteOperation,
    proposed: Option<RoleSet>,
    original: Option<RoleSet>,
) -> StaybookResult<RoleCheckReport> {
    let ctx = match actor {
        Some(roles) => AccessContext::user(Principal::new(actor_id, roles)?),
        None => AccessContext::anonymous(),
    };

    let result = RoleAuthority::new().validate_role_assignment(
        &ctx,
        operation,
        proposed.as_ref(),
        original.as_ref(),
    );

    let report = match result {
        Ok(stored_roles) => RoleCheckReport {
            actor: ctx.summary(),
            operation,
            allowed: true,
            stored_roles,
            rejected_role: None,
            reason: None,
        },
        Err(e) if e.is_policy_rejection() => RoleCheckReport {
            actor: ctx.summary(),
            operation,
            allowed: false,
            stored_roles: None,
            rejected_role: match &e {
                StaybookError::RoleEscalation { role, .. } => Some(role.to_string()),
                _ => None,
            },
            reason: Some(e.to_string()),
        },
        Err(e) => return Err(e),
    };
    Ok(report)
}

fn handle_invite(action: InviteAction, config: &StaybookConfig) -> StaybookResult<()> {
    let issuer = InviteIssuer::new(&config.invite);

    match action {
        InviteAction::Issue { booking, inviter } => {
            log_operation_start!("invite_issue", booking = %booking);
            let token = issuer.issue(&booking.as_str().into(), &inviter.into(), Utc::now())?;
            let claims = issuer.verify(&token)?;
            log_operation_success!("invite_issue", jti = %claims.jti);
            print_json(&json!({
                "token": token,
                "url": issuer.invite_url(&token),
                "claims": claims,
            }))
        }
        InviteAction::Verify { token } => match issuer.verify(&token) {
            Ok(claims) => print_json(&claims),
            Err(e) => {
                log_operation_error!("invite_verify", e);
                Err(e)
            }
        },
    }
}

fn handle_config(
    config_path: Option<&PathBuf>,
    show: bool,
    init: bool,
    validate: bool,
) -> StaybookResult<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        StaybookConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {:?}", path);
        println!(
            "Set invite.secret (or {}) before issuing real invites.",
            INVITE_SECRET_ENV
        );
    }

    if show {
        let config = read_config(config_path)?;
        let rendered = toml::to_string_pretty(&config).map_err(|e| StaybookError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("show_config"),
        })?;
        println!("{}", rendered);
    }

    if validate {
        let config = read_config(config_path)?;
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Get the default configuration file path
fn default_config_path() -> StaybookResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("staybook").join("config.toml"))
        .ok_or_else(|| config_error!("Could not determine a configuration directory", "cli"))
}

fn print_json<T: Serialize>(value: &T) -> StaybookResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::LogFormat;

    #[test]
    fn test_cli_parses_role_lists() {
        let cli = Cli::try_parse_from([
            "staybook",
            "roles",
            "--actor",
            "guest",
            "--operation",
            "update",
            "--proposed",
            "guest,customer",
            "--original",
            "guest",
        ])
        .unwrap();

        let Commands::Roles {
            actor,
            actor_id,
            operation,
            proposed,
            original,
        } = cli.command
        else {
            panic!("expected the roles command");
        };

        let report = handle_roles(actor, actor_id, operation, proposed, original).unwrap();
        assert!(!report.allowed);
        assert_eq!(report.rejected_role.as_deref(), Some("customer"));
    }

    #[test]
    fn test_anonymous_registration_report() {
        let report =
            handle_roles(None, "cli-user".to_string(), WriteOperation::Create, None, None)
                .unwrap();
        assert!(report.allowed);
        assert_eq!(report.stored_roles, Some("guest".parse().unwrap()));
    }

    #[test]
    fn test_logging_follows_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staybook.toml");
        std::fs::write(
            &path,
            r#"
            [logging]
            level = "warn"
            format = "json"
            "#,
        )
        .unwrap();

        let logging = logging_settings(Some(&path), false);
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Json);

        let logging = logging_settings(Some(&path), true);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        let missing = dir.path().join("absent.toml");
        assert_eq!(logging_settings(Some(&missing), false).level, "info");
    }

    #[test]
    fn test_invalid_config_is_refused_before_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staybook.toml");
        std::fs::write(
            &path,
            r#"
            [invite]
            secret = "s3cret"
            ttl_hours = 3000000000
            "#,
        )
        .unwrap();

        assert!(read_config(Some(&path)).is_ok());
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, StaybookError::Config { .. }));

        let action = InviteAction::Issue {
            booking: "b1".to_string(),
            inviter: "u1".to_string(),
        };
        assert!(run(Commands::Invite { action }, Some(&path)).is_err());
    }

    #[test]
    fn test_empty_actor_roles_are_rejected() {
        assert!(handle_roles(
            Some(RoleSet::new()),
            "u1".to_string(),
            WriteOperation::Create,
            None,
            None
        )
        .is_err());
    }
}
