use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use taskdeck_auth::TokenCodec;

use crate::app::envelope;
use crate::context::Identity;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenCodec>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claim = state
        .tokens
        .verify(token, Utc::now())
        .map_err(|_e| unauthorized())?;

    req.extensions_mut().insert(Identity::new(claim));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(unauthorized)?;

    let header = header.to_str().map_err(|_| unauthorized())?;

    let header = header.strip_prefix("Bearer ").ok_or_else(unauthorized)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(unauthorized());
    }

    Ok(token)
}

fn unauthorized() -> Response {
    envelope::fail(StatusCode::UNAUTHORIZED, "Invalid or missing token")
}
