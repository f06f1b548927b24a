use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use civitas_common::CivitasError;

/// Maps the domain error taxonomy onto HTTP responses. Infrastructure
/// failures collapse into a generic 500; their detail goes to the log,
/// never to the caller.
pub struct ApiError(pub CivitasError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CivitasError> for ApiError {
    fn from(e: CivitasError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CivitasError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CivitasError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            CivitasError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CivitasError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            CivitasError::InvalidState(msg) => (StatusCode::CONFLICT, msg.clone()),
            CivitasError::NoOp => (StatusCode::BAD_REQUEST, "no changes requested".to_string()),
            CivitasError::Database(_) | CivitasError::Config(_) | CivitasError::Anyhow(_) => {
                error!(error = %self.0, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: CivitasError) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(status_of(CivitasError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CivitasError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(CivitasError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CivitasError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(CivitasError::InvalidState("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(CivitasError::NoOp), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn infrastructure_detail_is_not_leaked() {
        let response =
            ApiError(CivitasError::Database("password=hunter2 connection refused".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body is the generic message only; the detail stays in the log.
    }
}
