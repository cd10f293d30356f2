//! JSON error responses for the API surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use haggle_types::HaggleError;
use serde_json::json;

/// Wrapper giving `HaggleError` an HTTP shape
pub struct ApiError(pub HaggleError);

impl From<HaggleError> for ApiError {
    fn from(err: HaggleError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HaggleError::ResourceNotFound { .. }
            | HaggleError::TokenNotFound { .. }
            | HaggleError::UnknownAccessKey => StatusCode::NOT_FOUND,
            HaggleError::AlreadyCompleted { .. } => StatusCode::CONFLICT,
            HaggleError::ArtifactExpired { .. } => StatusCode::GONE,
            HaggleError::InvalidReceipt { .. }
            | HaggleError::PriceOverflow
            | HaggleError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            HaggleError::Gateway { .. } | HaggleError::Peer { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "code": self.0.error_code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_release_maps_to_conflict() {
        let response = ApiError(HaggleError::AlreadyCompleted {
            token: "payreq_x".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_expired_artifact_maps_to_gone() {
        let response = ApiError(HaggleError::ArtifactExpired {
            expired_at: "2026-01-01T00:00:00Z".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::GONE);
    }
}
