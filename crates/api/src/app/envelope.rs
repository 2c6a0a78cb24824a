//! Response envelope: every endpoint answers `{ "success": bool, ... }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use taskdeck_core::{AppError, PageInfo, PageRequest};

pub fn ok(data: impl Serialize) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn ok_with_message(message: &str, data: impl Serialize) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

pub fn created(data: impl Serialize) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

pub fn created_with_message(message: &str, data: impl Serialize) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

pub fn message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

pub fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// The `pagination` object carried by every list response.
pub fn pagination(page: &PageRequest, total: u64) -> serde_json::Value {
    let info = PageInfo::new(page, total);
    json!({
        "currentPage": info.current_page,
        "totalPages": info.total_pages,
        "limit": info.limit,
    })
}

/// Map a domain error onto its HTTP status and envelope.
///
/// `Internal` deliberately answers with a fixed message; causes are already
/// logged where they happened and never leak to clients.
pub fn error(err: AppError) -> Response {
    match err {
        AppError::Validation(msg) => fail(StatusCode::BAD_REQUEST, &msg),
        AppError::Conflict(msg) => fail(StatusCode::CONFLICT, &msg),
        AppError::NotFound => fail(StatusCode::NOT_FOUND, "Resource not found"),
        AppError::Authentication(msg) => fail(StatusCode::UNAUTHORIZED, &msg),
        AppError::Authorization(msg) => fail(StatusCode::FORBIDDEN, &msg),
        AppError::QuotaExceeded(msg) => fail(StatusCode::FORBIDDEN, &msg),
        AppError::Internal(_) => fail(StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
    }
}

/// Handler error type: lets handlers use `?` on anything convertible to
/// [`AppError`] (store results, authorization denials) and still produce the
/// envelope-shaped error body.
pub struct ApiError(AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error(self.0)
    }
}

pub type ApiResult = Result<Response, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_auth::Denial;

    fn status_of(err: AppError) -> StatusCode {
        error(err).status()
    }

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(
            status_of(AppError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::conflict("dup")), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::authentication("no")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::authorization("no")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(AppError::quota("full")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::internal("secret detail")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn tenant_mismatch_denial_reads_as_not_found() {
        let err: AppError = Denial::TenantMismatch.into();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }
}
