use crate::app::media::MediaStore;
use crate::app::recipe_service::RecipeService;
use crate::app::user_service::UserService;
use crate::domain::model::{Recipe, RecipeAttr, RecipeDetail, User};
use crate::infra::config::AppConfig;
use crate::storage::Store;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub recipes: RecipeService,
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let users = UserService::new(store.clone(), &config);
        let recipes = RecipeService::new(store.clone(), MediaStore::new(config.media_root.clone()));
        Self {
            users,
            recipes,
            store,
            config: Arc::new(config),
        }
    }

    /// Public URL of a stored media path.
    pub fn media_url(&self, path: &str) -> String {
        format!("{}{}", self.config.media_url, path)
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

// --- request bodies (documentation only; handlers read raw JSON) ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AttrRequest {
    pub name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    /// Up to 5 digits, 2 of them after the point.
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    /// Ids of the caller's own tags.
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
    /// Ids of the caller's own ingredients.
    #[serde(default)]
    pub ingredients: Option<Vec<i64>>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AdminUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

// --- query strings ---

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttrListQuery {
    /// Any non-zero integer lists only entries used by at least one of your recipes.
    #[serde(default)]
    pub assigned_only: Option<String>,
}

impl AttrListQuery {
    /// Non-zero integers and `true` switch the filter on; anything else leaves it off.
    pub fn assigned_only(&self) -> bool {
        match self.assigned_only.as_deref().map(str::trim) {
            Some("true") | Some("True") => true,
            Some(raw) => raw.parse::<i64>().map(|n| n != 0).unwrap_or(false),
            None => false,
        }
    }
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids; a recipe matches if it has any of them.
    #[serde(default)]
    pub tags: Option<String>,
    /// Comma-separated ingredient ids; a recipe matches if it has any of them.
    #[serde(default)]
    pub ingredients: Option<String>,
}

// --- response bodies ---

#[derive(Serialize, Debug, ToSchema)]
pub struct UserView {
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct AdminUserView {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for AdminUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenView {
    pub token: String,
}

/// A tag or ingredient.
#[derive(Serialize, Debug, ToSchema)]
pub struct AttrView {
    pub id: i64,
    pub name: String,
}

impl From<&RecipeAttr> for AttrView {
    fn from(attr: &RecipeAttr) -> Self {
        Self {
            id: attr.id,
            name: attr.name.clone(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct RecipeView {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    pub link: String,
    /// Public URL of the uploaded image.
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl RecipeView {
    pub fn new(state: &AppState, recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            image: recipe.image.as_deref().map(|p| state.media_url(p)),
            tags: recipe.tags.clone(),
            ingredients: recipe.ingredients.clone(),
        }
    }
}

/// A recipe with tags and ingredients expanded.
#[derive(Serialize, Debug, ToSchema)]
pub struct RecipeDetailView {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<AttrView>,
    pub ingredients: Vec<AttrView>,
}

impl RecipeDetailView {
    pub fn new(state: &AppState, detail: &RecipeDetail) -> Self {
        let recipe = &detail.recipe;
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            image: recipe.image.as_deref().map(|p| state.media_url(p)),
            tags: detail.tags.iter().map(AttrView::from).collect(),
            ingredients: detail.ingredients.iter().map(AttrView::from).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct RecipeImageView {
    pub id: i64,
    pub image: Option<String>,
}

impl RecipeImageView {
    pub fn new(state: &AppState, recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image.as_deref().map(|p| state.media_url(p)),
        }
    }
}
