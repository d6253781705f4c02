//! Staff-only user management.

use crate::error::AppResult;
use crate::transport::http::auth::StaffUser;
use crate::transport::http::handlers::common::{json_body, path_id, reply};
use crate::transport::http::types::{AdminUserRequest, AdminUserView, ApiResponse, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::info;

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users by id; data is `[AdminUserView]`", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 403, description = "Caller is not staff", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "admin"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
) -> AppResult<Response> {
    let users = state.users.list_users().await?;
    let views: Vec<AdminUserView> = users.iter().map(AdminUserView::from).collect();
    reply(StatusCode::OK, &views)
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = AdminUserRequest,
    responses(
        (status = 201, description = "User created; data is `AdminUserView`", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 403, description = "Caller is not staff", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "admin"
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let user = state.users.admin_create_user(&body).await?;
    info!(staff_id = staff.id, user_id = user.id, "admin created user");
    reply(StatusCode::CREATED, &AdminUserView::from(&user))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "data is `AdminUserView`", body = ApiResponse),
        (status = 403, description = "Caller is not staff", body = ApiResponse),
        (status = 404, description = "No such user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "admin"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let user = state.users.get_user(id).await?;
    reply(StatusCode::OK, &AdminUserView::from(&user))
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = AdminUserRequest,
    responses(
        (status = 200, description = "User changed; data is `AdminUserView`", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 403, description = "Caller is not staff", body = ApiResponse),
        (status = 404, description = "No such user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "admin"
)]
pub async fn update_user_handler(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let body = json_body(body)?;
    let user = state.users.admin_update_user(id, &body).await?;
    info!(staff_id = staff.id, user_id = user.id, "admin changed user");
    reply(StatusCode::OK, &AdminUserView::from(&user))
}
