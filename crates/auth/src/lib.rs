//! `taskdeck-auth` — identity claims and the authorization decision engine.
//!
//! This crate is intentionally decoupled from HTTP and storage. The API layer
//! hands it decoded claims and resource ownership facts; it hands back
//! allow/deny decisions. No IO happens here.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod token;

pub use authorize::{Action, Denial, ResourceFacts, authorize};
pub use claims::{Claim, TokenClaims, TokenValidationError, validate_window};
pub use password::{CredentialError, hash_password, verify_password};
pub use token::{Hs256TokenCodec, TokenCodec, TokenError};
