//! Error taxonomy shared by every layer.
//!
//! Keep this focused on caller-meaningful outcomes. Internal faults are
//! wrapped with a message that is safe to surface; the underlying cause is
//! logged at the point of failure, never propagated to callers.

use thiserror::Error;

/// Result type used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed or missing required field; the caller can fix the request.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unique-constraint violation (duplicate subdomain, duplicate in-tenant email).
    #[error("{0}")]
    Conflict(String),

    /// Resource absent, or present but out of the caller's tenant.
    /// The two cases are deliberately collapsed into one signal.
    #[error("not found")]
    NotFound,

    /// Bad credentials.
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but insufficient role/ownership, or inactive account/tenant.
    #[error("{0}")]
    Authorization(String),

    /// Tenant ceiling reached.
    #[error("{0}")]
    QuotaExceeded(String),

    /// Store unavailable or unexpected fault. The message must already be
    /// scrubbed of internal identifiers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn quota(msg: impl Into<String>) -> Self {
        Self::QuotaExceeded(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
