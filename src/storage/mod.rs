//! Persistence for users, tokens and the owner-scoped recipe entities.
//!
//! [`Store`] is the seam between the services and the database. Every entity
//! query takes the owning user's id; rows belonging to anyone else are simply
//! not found. Two implementations exist: [`PgStore`] on PostgreSQL and
//! [`MemoryStore`] for tests and throwaway local runs.

use crate::domain::model::{AttrKind, NewRecipe, NewUser, Recipe, RecipeAttr, RecipeFilter, User};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with this {field} already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check.
    async fn ping(&self) -> StoreResult<()>;

    // --- users ---

    /// Fails with [`StoreError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Writes every mutable column of `user`.
    async fn update_user(&self, user: &User) -> StoreResult<User>;
    /// All users, ordered by id.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    // --- tokens ---

    /// Stores `token_hash` as the user's only token, replacing any previous one.
    async fn replace_token(&self, user_id: i64, token_hash: &str) -> StoreResult<()>;
    async fn user_by_token(&self, token_hash: &str) -> StoreResult<Option<User>>;

    // --- tags and ingredients ---

    async fn insert_attr(&self, kind: AttrKind, user_id: i64, name: &str)
        -> StoreResult<RecipeAttr>;
    /// The user's rows ordered by name (then id) descending. With
    /// `assigned_only`, only rows linked from at least one of the user's recipes.
    async fn list_attrs(
        &self,
        kind: AttrKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<RecipeAttr>>;
    /// The user's rows among `ids`, ordered by id. Unknown and foreign ids are skipped.
    async fn attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> StoreResult<Vec<RecipeAttr>>;

    // --- recipes ---

    async fn insert_recipe(&self, user_id: i64, recipe: &NewRecipe) -> StoreResult<Recipe>;
    async fn recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>>;
    /// The user's recipes matching `filter`, newest (highest id) first.
    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>>;
    /// Writes the scalar columns, the image and both relation sets of `recipe`
    /// in one transaction. Scoped by `recipe.user_id`.
    async fn update_recipe(&self, recipe: &Recipe) -> StoreResult<Recipe>;
}
