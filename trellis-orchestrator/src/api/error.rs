//! API Error Handling
//!
//! Unified error type and conversion for API responses. Every error renders
//! as a JSON body with a stable machine-readable `code` and a human-readable
//! `error` message; internal detail never leaks to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::OrchestratorError;
use crate::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    /// Action illegal for the current lifecycle state.
    Conflict(String),
    /// Unrecognized action token; deliberately distinct from `NotFound`.
    MethodNotAllowed(String),
    Unauthorized(String),
    BadRequest(String),
    BadGateway(String),
    StorageError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "invalid_transition", msg),
            ApiError::MethodNotAllowed(msg) => {
                (StatusCode::METHOD_NOT_ALLOWED, "unsupported_action", msg)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation_failed", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_unavailable", msg),
            ApiError::StorageError(err) => {
                tracing::error!("Storage error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "code": code, "error": message })),
        )
            .into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::NotFound(msg) => ApiError::NotFound(msg),
            OrchestratorError::InvalidTransition(msg) => ApiError::Conflict(msg),
            OrchestratorError::UnsupportedAction(msg) => ApiError::MethodNotAllowed(msg),
            OrchestratorError::InvalidSecret => {
                ApiError::Unauthorized("Invalid pipeline secret".to_string())
            }
            OrchestratorError::Validation(msg) => ApiError::BadRequest(msg),
            OrchestratorError::UpstreamUnavailable(msg) => ApiError::BadGateway(msg),
            OrchestratorError::Storage(err) => ApiError::StorageError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_action_is_405_not_404() {
        let err = ApiError::from(OrchestratorError::UnsupportedAction(
            "No valid action: 'publish'".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let err = ApiError::from(OrchestratorError::NotFound(
            "PipelineInstance was not found".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = ApiError::from(OrchestratorError::InvalidTransition(
            "Cannot start".to_string(),
        ));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
