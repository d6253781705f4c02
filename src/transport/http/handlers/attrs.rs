//! Tags and ingredients share one implementation; the routes only differ in kind.

use crate::domain::model::{AttrKind, User};
use crate::error::AppResult;
use crate::transport::http::auth::CurrentUser;
use crate::transport::http::handlers::common::{json_body, reply};
use crate::transport::http::types::{ApiResponse, AppState, AttrListQuery, AttrRequest, AttrView};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::Value as JsonValue;

async fn list(
    state: &AppState,
    user: &User,
    kind: AttrKind,
    query: Result<Query<AttrListQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let attrs = state
        .recipes
        .list_attrs(user, kind, query.assigned_only())
        .await?;
    let views: Vec<AttrView> = attrs.iter().map(AttrView::from).collect();
    reply(StatusCode::OK, &views)
}

async fn create(
    state: &AppState,
    user: &User,
    kind: AttrKind,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let attr = state.recipes.create_attr(user, kind, &body).await?;
    reply(StatusCode::CREATED, &AttrView::from(&attr))
}

#[utoipa::path(
    get,
    path = "/api/recipe/tags",
    params(AttrListQuery),
    responses(
        (status = 200, description = "The caller's tags, name descending; data is `[AttrView]`", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn list_tags_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<AttrListQuery>, QueryRejection>,
) -> AppResult<Response> {
    list(&state, &user, AttrKind::Tag, query).await
}

#[utoipa::path(
    post,
    path = "/api/recipe/tags",
    request_body = AttrRequest,
    responses(
        (status = 201, description = "Tag created; data is `AttrView`", body = ApiResponse),
        (status = 400, description = "Invalid name", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn create_tag_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    create(&state, &user, AttrKind::Tag, body).await
}

#[utoipa::path(
    get,
    path = "/api/recipe/ingredients",
    params(AttrListQuery),
    responses(
        (status = 200, description = "The caller's ingredients, name descending; data is `[AttrView]`", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn list_ingredients_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<AttrListQuery>, QueryRejection>,
) -> AppResult<Response> {
    list(&state, &user, AttrKind::Ingredient, query).await
}

#[utoipa::path(
    post,
    path = "/api/recipe/ingredients",
    request_body = AttrRequest,
    responses(
        (status = 201, description = "Ingredient created; data is `AttrView`", body = ApiResponse),
        (status = 400, description = "Invalid name", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn create_ingredient_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    create(&state, &user, AttrKind::Ingredient, body).await
}
