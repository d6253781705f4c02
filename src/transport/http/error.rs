use crate::error::AppError;
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                let data = json!({ "errors": errors });
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::failure(errors.to_string(), Some(data))),
                )
                    .into_response()
            }
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ApiResponse::failure(
                    "Authentication credentials were not provided or are invalid",
                    None,
                )),
            )
                .into_response(),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::failure(
                    "You do not have permission to perform this action",
                    None,
                )),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::failure("Not found", None)),
            )
                .into_response(),
            AppError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                internal_error()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal failure");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::failure("Internal server error", None)),
    )
        .into_response()
}

/// Malformed JSON bodies surface as a non-field validation error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::field(
            crate::error::NON_FIELD_ERRORS,
            format!("JSON parse error - {}", rejection.body_text()),
        )
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::field(
            crate::error::NON_FIELD_ERRORS,
            format!("Invalid query string - {}", rejection.body_text()),
        )
    }
}
