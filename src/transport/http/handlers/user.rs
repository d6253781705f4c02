use crate::error::AppResult;
use crate::transport::http::auth::CurrentUser;
use crate::transport::http::handlers::common::{json_body, reply};
use crate::transport::http::types::{
    ApiResponse, AppState, CredentialsRequest, ProfileUpdateRequest, TokenView, UserView,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created; data is `UserView`", body = ApiResponse),
        (status = 400, description = "Invalid email, short password or email taken", body = ApiResponse)
    ),
    tag = "user"
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let user = state.users.signup(&body).await?;
    reply(StatusCode::CREATED, &UserView::from(&user))
}

#[utoipa::path(
    post,
    path = "/api/user/token",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Token issued; data is `TokenView`", body = ApiResponse),
        (status = 400, description = "Missing fields or bad credentials", body = ApiResponse)
    ),
    tag = "user"
)]
pub async fn create_token_handler(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let token = state.users.obtain_token(&body).await?;
    reply(StatusCode::OK, &TokenView { token })
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "The caller's profile; data is `UserView`", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "user"
)]
pub async fn me_handler(CurrentUser(user): CurrentUser) -> AppResult<Response> {
    reply(StatusCode::OK, &UserView::from(&user))
}

#[utoipa::path(
    put,
    path = "/api/user/me",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Profile replaced", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "user"
)]
pub async fn replace_me_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let user = state.users.update_profile(&user, &body, false).await?;
    reply(StatusCode::OK, &UserView::from(&user))
}

#[utoipa::path(
    patch,
    path = "/api/user/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "user"
)]
pub async fn patch_me_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let user = state.users.update_profile(&user, &body, true).await?;
    reply(StatusCode::OK, &UserView::from(&user))
}
