//! Identity claims (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskdeck_core::{Role, TenantId, UserId};

/// The authenticated identity asserted for a request.
///
/// `tenant_id` is `None` only for super_admin: a tenant-less global identity.
/// Every authorization decision consumes exactly this triple.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Claim {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub role: Role,
}

/// JWT claims model as carried on the wire.
///
/// This is the minimal set of claims taskdeck expects once a token has been
/// decoded/verified. `iat`/`exp` are unix seconds per RFC 7519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Tenant context, absent for super_admin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,

    pub role: Role,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl TokenClaims {
    pub fn claim(&self) -> Claim {
        Claim {
            user_id: self.sub,
            tenant_id: self.tenant_id,
            role: self.role,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the token's validity window.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::token`]; the two compose in `TokenCodec::verify`.
pub fn validate_window(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: UserId::new(),
            tenant_id: Some(TenantId::new()),
            role: Role::User,
            iat,
            exp,
        }
    }

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn valid_window_passes() {
        assert_eq!(validate_window(&claims(100, 200), at(150)), Ok(()));
    }

    #[test]
    fn expired_token_is_rejected() {
        assert_eq!(
            validate_window(&claims(100, 200), at(200)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn future_token_is_rejected() {
        assert_eq!(
            validate_window(&claims(100, 200), at(99)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_window(&claims(200, 100), at(150)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
