use crate::error::{AppError, AppResult};
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Wraps `data` in a successful envelope.
pub fn reply<T: Serialize>(status: StatusCode, data: &T) -> AppResult<Response> {
    let data = serde_json::to_value(data).map_err(anyhow::Error::from)?;
    Ok((status, Json(ApiResponse::ok(data))).into_response())
}

/// Unwraps a JSON body, turning parse failures into a 400.
pub fn json_body(body: Result<Json<JsonValue>, JsonRejection>) -> AppResult<JsonValue> {
    let Json(value) = body?;
    Ok(value)
}

/// Unwraps an `{id}` segment. One that does not parse as `i64` is a 404.
pub fn path_id(id: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    match id {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "unparsable path id");
            Err(AppError::NotFound)
        }
    }
}
