//! In-process [`Store`] with the same semantics as the PostgreSQL one.
//!
//! Names compare byte-wise, matching the `"C"` collation used by `PgStore`.

use crate::domain::model::{AttrKind, NewRecipe, NewUser, Recipe, RecipeAttr, RecipeFilter, User};
use crate::storage::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    /// token hash -> user id
    tokens: HashMap<String, i64>,
    tags: BTreeMap<i64, RecipeAttr>,
    ingredients: BTreeMap<i64, RecipeAttr>,
    recipes: BTreeMap<i64, Recipe>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn attrs(&self, kind: AttrKind) -> &BTreeMap<i64, RecipeAttr> {
        match kind {
            AttrKind::Tag => &self.tags,
            AttrKind::Ingredient => &self.ingredients,
        }
    }

    fn attrs_mut(&mut self, kind: AttrKind) -> &mut BTreeMap<i64, RecipeAttr> {
        match kind {
            AttrKind::Tag => &mut self.tags,
            AttrKind::Ingredient => &mut self.ingredients,
        }
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    /// Keeps only ids that exist, mirroring the link tables' foreign keys.
    fn existing(&self, kind: AttrKind, ids: &[i64]) -> Vec<i64> {
        let attrs = self.attrs(kind);
        let mut kept: Vec<i64> = ids.iter().copied().filter(|id| attrs.contains_key(id)).collect();
        kept.sort_unstable();
        kept.dedup();
        kept
    }
}

/// Every table lives behind one lock, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.email_taken(&user.email, None) {
            return Err(StoreError::Conflict {
                entity: "user",
                field: "email",
            });
        }
        let id = t.next_id();
        let row = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            date_joined: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::Conflict {
                entity: "user",
                field: "email",
            });
        }
        let row = t.users.get_mut(&user.id).ok_or(StoreError::Missing {
            entity: "user",
            id: user.id,
        })?;
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.is_active = user.is_active;
        row.is_staff = user.is_staff;
        row.is_superuser = user.is_superuser;
        Ok(row.clone())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn replace_token(&self, user_id: i64, token_hash: &str) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::Missing {
                entity: "user",
                id: user_id,
            });
        }
        t.tokens.retain(|_, owner| *owner != user_id);
        t.tokens.insert(token_hash.to_string(), user_id);
        Ok(())
    }

    async fn user_by_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.tokens
            .get(token_hash)
            .and_then(|id| t.users.get(id))
            .cloned())
    }

    async fn insert_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> StoreResult<RecipeAttr> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let row = RecipeAttr {
            id,
            name: name.to_string(),
            user_id,
        };
        t.attrs_mut(kind).insert(id, row.clone());
        Ok(row)
    }

    async fn list_attrs(
        &self,
        kind: AttrKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<RecipeAttr>> {
        let t = self.tables.read().await;
        let mut rows: Vec<RecipeAttr> = t
            .attrs(kind)
            .values()
            .filter(|a| a.user_id == user_id)
            .filter(|a| {
                !assigned_only
                    || t.recipes
                        .values()
                        .any(|r| r.user_id == user_id && r.attr_ids(kind).contains(&a.id))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> StoreResult<Vec<RecipeAttr>> {
        let t = self.tables.read().await;
        Ok(t.attrs(kind)
            .values()
            .filter(|a| a.user_id == user_id && ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn insert_recipe(&self, user_id: i64, recipe: &NewRecipe) -> StoreResult<Recipe> {
        let mut t = self.tables.write().await;
        let tags = t.existing(AttrKind::Tag, &recipe.tags);
        let ingredients = t.existing(AttrKind::Ingredient, &recipe.ingredients);
        let id = t.next_id();
        let row = Recipe {
            id,
            user_id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            image: None,
            tags,
            ingredients,
        };
        t.recipes.insert(id, row.clone());
        Ok(row)
    }

    async fn recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let t = self.tables.read().await;
        Ok(t.recipes.get(&id).filter(|r| r.user_id == user_id).cloned())
    }

    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let t = self.tables.read().await;
        Ok(t.recipes
            .values()
            .rev()
            .filter(|r| r.user_id == user_id && filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> StoreResult<Recipe> {
        let mut t = self.tables.write().await;
        let tags = t.existing(AttrKind::Tag, &recipe.tags);
        let ingredients = t.existing(AttrKind::Ingredient, &recipe.ingredients);
        let row = t
            .recipes
            .get_mut(&recipe.id)
            .filter(|r| r.user_id == recipe.user_id)
            .ok_or(StoreError::Missing {
                entity: "recipe",
                id: recipe.id,
            })?;
        row.title = recipe.title.clone();
        row.time_minutes = recipe.time_minutes;
        row.price = recipe.price;
        row.link = recipe.link.clone();
        row.image = recipe.image.clone();
        row.tags = tags;
        row.ingredients = ingredients;
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn new_recipe(title: &str, tags: Vec<i64>, ingredients: Vec<i64>) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            time_minutes: 10,
            price: Decimal::new(500, 2),
            link: String::new(),
            tags,
            ingredients,
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .insert_user(NewUser::regular(email.to_string(), "hash".to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "a@x.com").await;
        let err = store
            .insert_user(NewUser::regular("a@x.com".into(), "h".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { field: "email", .. }));
    }

    #[tokio::test]
    async fn token_replacement_invalidates_previous() {
        let store = MemoryStore::new();
        let u = user(&store, "a@x.com").await;
        store.replace_token(u.id, "first").await.unwrap();
        store.replace_token(u.id, "second").await.unwrap();
        assert!(store.user_by_token("first").await.unwrap().is_none());
        assert_eq!(store.user_by_token("second").await.unwrap().unwrap().id, u.id);
    }

    #[tokio::test]
    async fn attrs_are_owner_scoped_and_sorted_descending() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com").await;
        let b = user(&store, "b@x.com").await;
        store.insert_attr(AttrKind::Tag, a.id, "Dessert").await.unwrap();
        store.insert_attr(AttrKind::Tag, a.id, "Vegan").await.unwrap();
        store.insert_attr(AttrKind::Tag, b.id, "Breakfast").await.unwrap();

        let names: Vec<String> = store
            .list_attrs(AttrKind::Tag, a.id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Vegan", "Dessert"]);
    }

    #[tokio::test]
    async fn attr_names_order_byte_wise() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com").await;
        for name in ["Banana", "apple", "Cherry"] {
            store.insert_attr(AttrKind::Tag, a.id, name).await.unwrap();
        }

        let names: Vec<String> = store
            .list_attrs(AttrKind::Tag, a.id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["apple", "Cherry", "Banana"]);
    }

    #[tokio::test]
    async fn assigned_only_lists_linked_attrs() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com").await;
        let used = store.insert_attr(AttrKind::Ingredient, a.id, "Salt").await.unwrap();
        store.insert_attr(AttrKind::Ingredient, a.id, "Pepper").await.unwrap();
        store
            .insert_recipe(a.id, &new_recipe("Fries", vec![], vec![used.id]))
            .await
            .unwrap();
        store
            .insert_recipe(a.id, &new_recipe("Chips", vec![], vec![used.id]))
            .await
            .unwrap();

        let assigned = store
            .list_attrs(AttrKind::Ingredient, a.id, true)
            .await
            .unwrap();
        assert_eq!(assigned, vec![used]);
    }

    #[tokio::test]
    async fn recipes_list_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com").await;
        let b = user(&store, "b@x.com").await;
        let first = store.insert_recipe(a.id, &new_recipe("One", vec![], vec![])).await.unwrap();
        let second = store.insert_recipe(a.id, &new_recipe("Two", vec![], vec![])).await.unwrap();
        store.insert_recipe(b.id, &new_recipe("Other", vec![], vec![])).await.unwrap();

        let ids: Vec<i64> = store
            .list_recipes(a.id, &RecipeFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(store.recipe(b.id, first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_foreign_recipe_is_missing() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com").await;
        let b = user(&store, "b@x.com").await;
        let mut recipe = store
            .insert_recipe(a.id, &new_recipe("One", vec![], vec![]))
            .await
            .unwrap();
        recipe.user_id = b.id;
        assert!(matches!(
            store.update_recipe(&recipe).await,
            Err(StoreError::Missing { entity: "recipe", .. })
        ));
    }
}
