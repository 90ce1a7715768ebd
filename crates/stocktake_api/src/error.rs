//! HTTP error mapping.
//!
//! Every handler returns [`ApiError`] on failure; the `IntoResponse` impl
//! renders the stable wire shape `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use stocktake_db::DbError;
use stocktake_gateway::GatewayError;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors surfaced over HTTP.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete request payload (400)
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// The external inventory platform failed or rate-limited us (502)
    #[error("{0}")]
    External(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::External(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::External(_) => "external_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(msg) => Self::NotFound(msg),
            other => Self::External(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "Request failed: {self}");
        }

        let body = ErrorBody {
            error: json!({
                "code": self.code(),
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("Task not found: 7").into();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn gateway_throttle_maps_to_502() {
        let err: ApiError = GatewayError::Throttled.into();
        assert!(matches!(err, ApiError::External(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::validation("items must not be empty");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "validation_error");
    }
}
