use crate::error::{AppError, AppResult};
use crate::transport::http::auth::CurrentUser;
use crate::transport::http::handlers::common::{json_body, path_id, reply};
use crate::transport::http::types::{
    ApiResponse, AppState, ImageUpload, RecipeDetailView, RecipeImageView, RecipeListQuery,
    RecipeRequest, RecipeView,
};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::Value as JsonValue;

/// Multipart field carrying the upload.
const IMAGE_FIELD: &str = "image";

#[utoipa::path(
    get,
    path = "/api/recipe/recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "The caller's recipes, newest first; data is `[RecipeView]`", body = ApiResponse),
        (status = 400, description = "Non-integer id in a filter", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn list_recipes_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<RecipeListQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let recipes = state
        .recipes
        .list_recipes(&user, query.tags.as_deref(), query.ingredients.as_deref())
        .await?;
    let views: Vec<RecipeView> = recipes.iter().map(|r| RecipeView::new(&state, r)).collect();
    reply(StatusCode::OK, &views)
}

#[utoipa::path(
    post,
    path = "/api/recipe/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created; data is `RecipeView`", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn create_recipe_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let body = json_body(body)?;
    let recipe = state.recipes.create_recipe(&user, &body).await?;
    reply(StatusCode::CREATED, &RecipeView::new(&state, &recipe))
}

#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe with expanded tags and ingredients; data is `RecipeDetailView`", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 404, description = "No such recipe for this user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn recipe_detail_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let detail = state.recipes.recipe_detail(&user, id).await?;
    reply(StatusCode::OK, &RecipeDetailView::new(&state, &detail))
}

#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe replaced; omitted relations are cleared", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 404, description = "No such recipe for this user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn replace_recipe_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let body = json_body(body)?;
    let recipe = state.recipes.update_recipe(&user, id, &body, false).await?;
    reply(StatusCode::OK, &RecipeView::new(&state, &recipe))
}

#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 404, description = "No such recipe for this user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn patch_recipe_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let body = json_body(body)?;
    let recipe = state.recipes.update_recipe(&user, id, &body, true).await?;
    reply(StatusCode::OK, &RecipeView::new(&state, &recipe))
}

#[utoipa::path(
    post,
    path = "/api/recipe/recipes/{id}/upload-image",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored; data is `RecipeImageView`", body = ApiResponse),
        (status = 400, description = "Missing file or not a JPEG/PNG image", body = ApiResponse),
        (status = 401, description = "Not authenticated", body = ApiResponse),
        (status = 404, description = "No such recipe for this user", body = ApiResponse)
    ),
    security(("token" = [])),
    tag = "recipe"
)]
pub async fn upload_image_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let id = path_id(id)?;
    let bad_upload = |e: String| AppError::field(IMAGE_FIELD, e);

    let mut upload = None;
    if let Ok(mut multipart) = multipart {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_upload(e.body_text()))?
        {
            if field.name() == Some(IMAGE_FIELD) {
                let bytes = field.bytes().await.map_err(|e| bad_upload(e.body_text()))?;
                upload = Some(bytes);
                break;
            }
        }
    }

    let recipe = state
        .recipes
        .upload_image(&user, id, upload.as_deref())
        .await?;
    reply(StatusCode::OK, &RecipeImageView::new(&state, &recipe))
}
