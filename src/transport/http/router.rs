use crate::transport::http::handlers::{admin, attrs, health, recipes, user};
use crate::transport::http::types::{
    AdminUserRequest, AdminUserView, ApiResponse, AppState, AttrRequest, AttrView,
    CredentialsRequest, ImageUpload, ProfileUpdateRequest, RecipeDetailView, RecipeImageView,
    RecipeRequest, RecipeView, TokenView, UserView,
};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        user::create_user_handler,
        user::create_token_handler,
        user::me_handler,
        user::replace_me_handler,
        user::patch_me_handler,
        attrs::list_tags_handler,
        attrs::create_tag_handler,
        attrs::list_ingredients_handler,
        attrs::create_ingredient_handler,
        recipes::list_recipes_handler,
        recipes::create_recipe_handler,
        recipes::recipe_detail_handler,
        recipes::replace_recipe_handler,
        recipes::patch_recipe_handler,
        recipes::upload_image_handler,
        admin::list_users_handler,
        admin::create_user_handler,
        admin::get_user_handler,
        admin::update_user_handler
    ),
    components(schemas(
        ApiResponse,
        CredentialsRequest,
        ProfileUpdateRequest,
        AttrRequest,
        RecipeRequest,
        AdminUserRequest,
        ImageUpload,
        UserView,
        AdminUserView,
        TokenView,
        AttrView,
        RecipeView,
        RecipeDetailView,
        RecipeImageView
    )),
    modifiers(&TokenAuth)
)]
#[allow(dead_code)]
pub struct ApiDoc;

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Not found", None)),
    )
}

async fn method_not_allowed_handler() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiResponse::failure("Method not allowed", None)),
    )
}

pub fn create_router(app_state: AppState) -> Router {
    let media_root = app_state.config.media_root.clone();
    let media_prefix = app_state.config.media_url.trim_end_matches('/').to_string();

    let router = Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/user/create", post(user::create_user_handler))
        .route("/api/user/token", post(user::create_token_handler))
        .route(
            "/api/user/me",
            get(user::me_handler)
                .put(user::replace_me_handler)
                .patch(user::patch_me_handler),
        )
        .route(
            "/api/recipe/tags",
            get(attrs::list_tags_handler).post(attrs::create_tag_handler),
        )
        .route(
            "/api/recipe/ingredients",
            get(attrs::list_ingredients_handler).post(attrs::create_ingredient_handler),
        )
        .route(
            "/api/recipe/recipes",
            get(recipes::list_recipes_handler).post(recipes::create_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/:id",
            get(recipes::recipe_detail_handler)
                .put(recipes::replace_recipe_handler)
                .patch(recipes::patch_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/:id/upload-image",
            post(recipes::upload_image_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/admin/users",
            get(admin::list_users_handler).post(admin::create_user_handler),
        )
        .route(
            "/admin/users/:id",
            get(admin::get_user_handler).patch(admin::update_user_handler),
        );

    // Nesting at "/" is not allowed, so a root media URL serves files as the fallback.
    let router = if media_prefix.is_empty() {
        router.fallback_service(ServeDir::new(media_root))
    } else {
        router
            .nest_service(&media_prefix, ServeDir::new(media_root))
            .fallback(not_found_handler)
    };

    router
        .method_not_allowed_fallback(method_not_allowed_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
