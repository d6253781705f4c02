//! PostgreSQL-backed [`Store`].

use crate::domain::model::{AttrKind, NewRecipe, NewUser, Recipe, RecipeAttr, RecipeFilter, User};
use crate::storage::schema::CREATE_STATEMENTS;
use crate::storage::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;

const USER_COLUMNS: &str =
    "id, email, password_hash, is_active, is_staff, is_superuser, date_joined";

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image,
    COALESCE((SELECT array_agg(rt.tag_id ORDER BY rt.tag_id)
              FROM recipe_tags rt WHERE rt.recipe_id = r.id), '{}'::BIGINT[]) AS tags,
    COALESCE((SELECT array_agg(ri.ingredient_id ORDER BY ri.ingredient_id)
              FROM recipe_ingredients ri WHERE ri.recipe_id = r.id), '{}'::BIGINT[]) AS ingredients";

/// Table, link table and link column for an attribute kind.
fn attr_tables(kind: AttrKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        AttrKind::Tag => ("tags", "recipe_tags", "tag_id"),
        AttrKind::Ingredient => ("ingredients", "recipe_ingredients", "ingredient_id"),
    }
}

fn map_unique(err: sqlx::Error, entity: &'static str, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict { entity, field }
        }
        _ => StoreError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and makes sure every table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::from_pool(pool);
        store.apply_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn apply_schema(&self) -> anyhow::Result<()> {
        for statement in CREATE_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema is up to date");
        Ok(())
    }

    async fn replace_links(
        tx: &mut Transaction<'_, Postgres>,
        kind: AttrKind,
        recipe_id: i64,
        ids: &[i64],
    ) -> StoreResult<()> {
        let (_, link_table, link_column) = attr_tables(kind);
        sqlx::query(&format!("DELETE FROM {link_table} WHERE recipe_id = $1"))
            .bind(recipe_id)
            .execute(tx.as_mut())
            .await?;
        if !ids.is_empty() {
            sqlx::query(&format!(
                "INSERT INTO {link_table} (recipe_id, {link_column})
                 SELECT $1, UNNEST($2::BIGINT[])"
            ))
            .bind(recipe_id)
            .bind(ids)
            .execute(tx.as_mut())
            .await?;
        }
        Ok(())
    }

    async fn fetch_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, is_active, is_staff, is_superuser)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "user", "email"))
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET email = $2, password_hash = $3, is_active = $4, is_staff = $5, is_superuser = $6
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, "user", "email"))?
        .ok_or(StoreError::Missing {
            entity: "user",
            id: user.id,
        })
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn replace_token(&self, user_id: i64, token_hash: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO auth_tokens (user_id, token_hash) VALUES ($1, $2)
             ON CONFLICT (user_id)
             DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = now()",
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "token", "key"))?;
        Ok(())
    }

    async fn user_by_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.password_hash, u.is_active, u.is_staff, u.is_superuser,
                    u.date_joined
             FROM users u JOIN auth_tokens t ON t.user_id = u.id
             WHERE t.token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> StoreResult<RecipeAttr> {
        let (table, _, _) = attr_tables(kind);
        let attr = sqlx::query_as::<_, RecipeAttr>(&format!(
            "INSERT INTO {table} (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(attr)
    }

    async fn list_attrs(
        &self,
        kind: AttrKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<RecipeAttr>> {
        let (table, link_table, link_column) = attr_tables(kind);
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT a.id, a.name, a.user_id FROM {table} a WHERE a.user_id = "
        ));
        qb.push_bind(user_id);
        if assigned_only {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM {link_table} l JOIN recipes r ON r.id = l.recipe_id
                  WHERE l.{link_column} = a.id AND r.user_id = "
            ));
            qb.push_bind(user_id);
            qb.push(")");
        }
        qb.push(" ORDER BY a.name COLLATE \"C\" DESC, a.id DESC");

        let attrs = qb
            .build_query_as::<RecipeAttr>()
            .fetch_all(&self.pool)
            .await?;
        Ok(attrs)
    }

    async fn attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> StoreResult<Vec<RecipeAttr>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (table, _, _) = attr_tables(kind);
        let attrs = sqlx::query_as::<_, RecipeAttr>(&format!(
            "SELECT id, name, user_id FROM {table}
             WHERE user_id = $1 AND id = ANY($2)
             ORDER BY id"
        ))
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(attrs)
    }

    async fn insert_recipe(&self, user_id: i64, recipe: &NewRecipe) -> StoreResult<Recipe> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO recipes (user_id, title, time_minutes, price, link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .fetch_one(tx.as_mut())
        .await?;

        Self::replace_links(&mut tx, AttrKind::Tag, id, &recipe.tags).await?;
        Self::replace_links(&mut tx, AttrKind::Ingredient, id, &recipe.ingredients).await?;
        tx.commit().await?;

        self.fetch_recipe(user_id, id)
            .await?
            .ok_or(StoreError::Missing { entity: "recipe", id })
    }

    async fn recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        self.fetch_recipe(user_id, id).await
    }

    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.user_id = "
        ));
        qb.push_bind(user_id);
        if let Some(tags) = &filter.tags {
            qb.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags ft
                  WHERE ft.recipe_id = r.id AND ft.tag_id = ANY(",
            );
            qb.push_bind(tags.clone());
            qb.push("))");
        }
        if let Some(ingredients) = &filter.ingredients {
            qb.push(
                " AND EXISTS (SELECT 1 FROM recipe_ingredients fi
                  WHERE fi.recipe_id = r.id AND fi.ingredient_id = ANY(",
            );
            qb.push_bind(ingredients.clone());
            qb.push("))");
        }
        qb.push(" ORDER BY r.id DESC");

        let recipes = qb.build_query_as::<Recipe>().fetch_all(&self.pool).await?;
        Ok(recipes)
    }

    async fn update_recipe(&self, recipe: &Recipe) -> StoreResult<Recipe> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE recipes
             SET title = $3, time_minutes = $4, price = $5, link = $6, image = $7
             WHERE id = $1 AND user_id = $2",
        )
        .bind(recipe.id)
        .bind(recipe.user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .bind(&recipe.image)
        .execute(tx.as_mut())
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(StoreError::Missing {
                entity: "recipe",
                id: recipe.id,
            });
        }

        Self::replace_links(&mut tx, AttrKind::Tag, recipe.id, &recipe.tags).await?;
        Self::replace_links(&mut tx, AttrKind::Ingredient, recipe.id, &recipe.ingredients).await?;
        tx.commit().await?;

        self.fetch_recipe(recipe.user_id, recipe.id)
            .await?
            .ok_or(StoreError::Missing {
                entity: "recipe",
                id: recipe.id,
            })
    }
}
