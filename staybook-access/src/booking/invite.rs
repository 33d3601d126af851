//! Booking invite tokens
//!
//! HS256 JWTs naming the booking they admit a guest to.

use crate::model::{BookingId, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use staybook_core::{ErrorContext, InviteConfig, StaybookError, StaybookResult};
use tracing::debug;

/// Invite token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteClaims {
    pub booking_id: BookingId,
    /// User that issued the invite
    pub inviter: UserId,
    /// Token id, unique per issued invite
    pub jti: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

/// Signs and verifies invite tokens
pub struct InviteIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
    base_url: String,
    accept_path: String,
}

impl InviteIssuer {
    pub fn new(config: &InviteConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_hours: config.ttl_hours,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            accept_path: config.accept_path.clone(),
        }
    }

    /// Issue a token for `booking`, valid from `now` for the configured lifetime
    pub fn issue(
        &self,
        booking: &BookingId,
        inviter: &UserId,
        now: DateTime<Utc>,
    ) -> StaybookResult<String> {
        let expires_at = TimeDelta::try_hours(self.ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| StaybookError::Config {
                message: format!(
                    "invite lifetime of {} hours is out of range",
                    self.ttl_hours
                ),
                source: None,
                context: ErrorContext::new("invite")
                    .with_operation("issue")
                    .with_suggestion("Lower invite.ttl_hours"),
            })?;

        let claims = InviteClaims {
            booking_id: booking.clone(),
            inviter: inviter.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            StaybookError::Internal {
                message: format!("Failed to sign invite token: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("invite").with_operation("issue"),
            }
        })
    }

    /// Check signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> StaybookResult<InviteClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        decode::<InviteClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Invite token rejected");
                let message = match e.kind() {
                    ErrorKind::ExpiredSignature => "invite has expired",
                    ErrorKind::InvalidSignature => "invite signature does not match",
                    _ => "invite token is malformed",
                };
                invalid_token(message)
            })
    }

    /// Link a guest opens to accept the invite
    pub fn invite_url(&self, token: &str) -> String {
        format!("{}{}?token={}", self.base_url, self.accept_path, token)
    }
}

pub(crate) fn invalid_token(message: &str) -> StaybookError {
    StaybookError::InvalidToken {
        message: message.to_string(),
        context: ErrorContext::new("invite")
            .with_operation("verify")
            .with_suggestion("Ask the booking owner for a fresh invite link"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> InviteIssuer {
        InviteIssuer::new(&InviteConfig {
            secret: secret.to_string(),
            ..InviteConfig::default()
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("s3cret");
        let token = issuer
            .issue(&BookingId::from("b1"), &UserId::from("u1"), Utc::now())
            .unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.booking_id, BookingId::from("b1"));
        assert_eq!(claims.inviter, UserId::from("u1"));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = issuer("s3cret");
        let now = Utc::now();
        let booking = BookingId::from("b1");
        let inviter = UserId::from("u1");
        assert_ne!(
            issuer.issue(&booking, &inviter, now).unwrap(),
            issuer.issue(&booking, &inviter, now).unwrap()
        );
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer("s3cret");
        let long_ago = Utc::now() - TimeDelta::days(30);
        let token = issuer
            .issue(&BookingId::from("b1"), &UserId::from("u1"), long_ago)
            .unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn test_foreign_signature() {
        let token = issuer("one")
            .issue(&BookingId::from("b1"), &UserId::from("u1"), Utc::now())
            .unwrap();
        assert!(issuer("two").verify(&token).is_err());
        assert!(issuer("two").verify("not-a-token").is_err());
    }

    #[test]
    fn test_unrepresentable_lifetime_is_an_error() {
        let issuer = InviteIssuer::new(&InviteConfig {
            ttl_hours: 3_000_000_000,
            ..InviteConfig::default()
        });
        let err = issuer
            .issue(&BookingId::from("b1"), &UserId::from("u1"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StaybookError::Config { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_invite_url() {
        let issuer = InviteIssuer::new(&InviteConfig {
            base_url: "https://stay.example/".to_string(),
            ..InviteConfig::default()
        });
        assert_eq!(
            issuer.invite_url("abc.def.ghi"),
            "https://stay.example/guest/invite?token=abc.def.ghi"
        );
    }
}
