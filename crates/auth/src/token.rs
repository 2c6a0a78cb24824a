//! Bearer token encode/decode seam.
//!
//! The API layer depends on the [`TokenCodec`] trait, not the HS256
//! implementation, so tests (and a future asymmetric deployment) can swap the
//! codec without touching handlers.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{Claim, TokenClaims, TokenValidationError, validate_window};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token encoding failed: {0}")]
    Encode(String),
}

pub trait TokenCodec: Send + Sync {
    /// Issue a signed token for `claim`, valid for `ttl` starting at `now`.
    fn issue(&self, claim: Claim, now: DateTime<Utc>, ttl: Duration) -> Result<String, TokenError>;

    /// Verify signature and validity window, returning the embedded claim.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claim, TokenError>;
}

/// HMAC-SHA256 token codec.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, claim: Claim, now: DateTime<Utc>, ttl: Duration) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: claim.user_id,
            tenant_id: claim.tenant_id,
            role: claim.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claim, TokenError> {
        // The window is checked against the injected `now` (deterministic in
        // tests), so jsonwebtoken's own wall-clock exp check is disabled.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_window(&data.claims, now)?;
        Ok(data.claims.claim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::{Role, TenantId, UserId};

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(b"test-secret")
    }

    fn claim() -> Claim {
        Claim {
            user_id: UserId::new(),
            tenant_id: Some(TenantId::new()),
            role: Role::TenantAdmin,
        }
    }

    #[test]
    fn issue_then_verify_round_trips_the_claim() {
        let codec = codec();
        let claim = claim();
        let now = Utc::now();

        let token = codec.issue(claim, now, Duration::hours(24)).unwrap();
        let decoded = codec.verify(&token, now + Duration::hours(1)).unwrap();

        assert_eq!(decoded, claim);
    }

    #[test]
    fn expired_token_fails_verification() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue(claim(), now, Duration::hours(1)).unwrap();
        let err = codec.verify(&token, now + Duration::hours(2)).unwrap_err();

        assert_eq!(err, TokenError::Window(TokenValidationError::Expired));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let now = Utc::now();
        let token = codec().issue(claim(), now, Duration::hours(1)).unwrap();

        let other = Hs256TokenCodec::new(b"other-secret");
        assert!(matches!(
            other.verify(&token, now).unwrap_err(),
            TokenError::Malformed(_)
        ));
    }

    #[test]
    fn tenant_less_claim_survives_the_round_trip() {
        let codec = codec();
        let claim = Claim {
            user_id: UserId::new(),
            tenant_id: None,
            role: Role::SuperAdmin,
        };
        let now = Utc::now();

        let token = codec.issue(claim, now, Duration::hours(1)).unwrap();
        assert_eq!(codec.verify(&token, now).unwrap(), claim);
    }
}
