//! Owner-scoped tags, ingredients and recipes.
//!
//! Every read and write goes through the requesting user's id. A row owned by
//! somebody else behaves exactly like a row that does not exist.

use crate::app::media::MediaStore;
use crate::domain::model::{
    AttrKind, NewRecipe, Recipe, RecipeAttr, RecipeDetail, RecipeFilter, User,
};
use crate::domain::payload::{parse_id_csv, Payload, TextRules};
use crate::error::{AppError, AppResult, NON_FIELD_ERRORS};
use crate::storage::{Store, StoreError};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

const LINK_RULES: TextRules = TextRules {
    max_len: Some(255),
    min_len: None,
    allow_blank: true,
    trim: true,
};

const NO_FILE: &str = "No file was submitted.";
const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

fn missing_as_not_found(err: StoreError) -> AppError {
    match err {
        StoreError::Missing { .. } => AppError::NotFound,
        other => other.into(),
    }
}

/// Fields read from a create/update body. `None` means "not in the payload".
struct RecipeFields {
    title: Option<String>,
    time_minutes: Option<i32>,
    price: Option<rust_decimal::Decimal>,
    link: Option<String>,
    tags: Option<Vec<i64>>,
    ingredients: Option<Vec<i64>>,
}

#[derive(Clone)]
pub struct RecipeService {
    store: Arc<dyn Store>,
    media: MediaStore,
}

impl RecipeService {
    pub fn new(store: Arc<dyn Store>, media: MediaStore) -> Self {
        Self { store, media }
    }

    // --- tags and ingredients ---

    pub async fn list_attrs(
        &self,
        user: &User,
        kind: AttrKind,
        assigned_only: bool,
    ) -> AppResult<Vec<RecipeAttr>> {
        Ok(self.store.list_attrs(kind, user.id, assigned_only).await?)
    }

    /// `{name}` -> new tag or ingredient owned by `user`.
    pub async fn create_attr(
        &self,
        user: &User,
        kind: AttrKind,
        body: &JsonValue,
    ) -> AppResult<RecipeAttr> {
        let mut p = Payload::new(body)?;
        let name = p.text("name", true, TextRules::NAME);
        p.finish()?;
        let name = name.ok_or_else(|| AppError::field("name", "Invalid name."))?;

        let attr = self.store.insert_attr(kind, user.id, &name).await?;
        info!(user_id = user.id, kind = kind.as_str(), id = attr.id, "created recipe attribute");
        Ok(attr)
    }

    // --- recipes ---

    /// Lists the user's recipes. `tags` and `ingredients` are comma-separated
    /// id lists; an empty list means "no filter".
    pub async fn list_recipes(
        &self,
        user: &User,
        tags: Option<&str>,
        ingredients: Option<&str>,
    ) -> AppResult<Vec<Recipe>> {
        let parse = |field: &str, raw: Option<&str>| -> AppResult<Option<Vec<i64>>> {
            match raw {
                Some(raw) => {
                    let ids = parse_id_csv(field, raw)?;
                    Ok((!ids.is_empty()).then_some(ids))
                }
                None => Ok(None),
            }
        };
        let filter = RecipeFilter {
            tags: parse("tags", tags)?,
            ingredients: parse("ingredients", ingredients)?,
        };
        debug!(user_id = user.id, ?filter, "listing recipes");
        Ok(self.store.list_recipes(user.id, &filter).await?)
    }

    pub async fn get_recipe(&self, user: &User, id: i64) -> AppResult<Recipe> {
        self.store
            .recipe(user.id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// A recipe with its tags and ingredients expanded.
    pub async fn recipe_detail(&self, user: &User, id: i64) -> AppResult<RecipeDetail> {
        let recipe = self.get_recipe(user, id).await?;
        let tags = self
            .store
            .attrs_by_ids(AttrKind::Tag, user.id, &recipe.tags)
            .await?;
        let ingredients = self
            .store
            .attrs_by_ids(AttrKind::Ingredient, user.id, &recipe.ingredients)
            .await?;
        Ok(RecipeDetail {
            recipe,
            tags,
            ingredients,
        })
    }

    /// Reads recipe fields. Scalars are required unless `partial`; relation
    /// lists are never required. Relation ids must name the user's own rows.
    async fn read_fields(
        &self,
        user: &User,
        body: &JsonValue,
        partial: bool,
    ) -> AppResult<RecipeFields> {
        let required = !partial;
        let mut p = Payload::new(body)?;
        let title = p.text("title", required, TextRules::NAME);
        let time_minutes = p.integer("time_minutes", required);
        let price = p.decimal("price", required, PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES);
        let link = p.text("link", false, LINK_RULES);
        let tags = p.id_list(AttrKind::Tag.field(), false);
        let ingredients = p.id_list(AttrKind::Ingredient.field(), false);

        for (kind, ids) in [(AttrKind::Tag, &tags), (AttrKind::Ingredient, &ingredients)] {
            let Some(ids) = ids else { continue };
            let owned = self.store.attrs_by_ids(kind, user.id, ids).await?;
            for id in ids {
                if !owned.iter().any(|a| a.id == *id) {
                    p.error(
                        kind.field(),
                        format!("Invalid pk \"{id}\" - object does not exist."),
                    );
                }
            }
        }
        p.finish()?;

        Ok(RecipeFields {
            title,
            time_minutes,
            price,
            link,
            tags,
            ingredients,
        })
    }

    pub async fn create_recipe(&self, user: &User, body: &JsonValue) -> AppResult<Recipe> {
        let fields = self.read_fields(user, body, false).await?;
        let (Some(title), Some(time_minutes), Some(price)) =
            (fields.title, fields.time_minutes, fields.price)
        else {
            return Err(AppError::field(NON_FIELD_ERRORS, "Invalid recipe payload."));
        };

        let recipe = self
            .store
            .insert_recipe(
                user.id,
                &NewRecipe {
                    title,
                    time_minutes,
                    price,
                    link: fields.link.unwrap_or_default(),
                    tags: fields.tags.unwrap_or_default(),
                    ingredients: fields.ingredients.unwrap_or_default(),
                },
            )
            .await?;
        info!(user_id = user.id, recipe_id = recipe.id, "created recipe");
        Ok(recipe)
    }

    /// Full (`partial == false`) or partial update.
    ///
    /// A full update replaces every writable field: an absent `link` becomes
    /// empty and absent relation lists become empty. A partial update only
    /// touches fields present in the body.
    pub async fn update_recipe(
        &self,
        user: &User,
        id: i64,
        body: &JsonValue,
        partial: bool,
    ) -> AppResult<Recipe> {
        let mut recipe = self.get_recipe(user, id).await?;
        let fields = self.read_fields(user, body, partial).await?;

        if let Some(title) = fields.title {
            recipe.title = title;
        }
        if let Some(time_minutes) = fields.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = fields.price {
            recipe.price = price;
        }
        match fields.link {
            Some(link) => recipe.link = link,
            None if !partial => recipe.link.clear(),
            None => {}
        }
        match fields.tags {
            Some(tags) => recipe.tags = tags,
            None if !partial => recipe.tags.clear(),
            None => {}
        }
        match fields.ingredients {
            Some(ingredients) => recipe.ingredients = ingredients,
            None if !partial => recipe.ingredients.clear(),
            None => {}
        }

        let saved = self
            .store
            .update_recipe(&recipe)
            .await
            .map_err(missing_as_not_found)?;
        info!(user_id = user.id, recipe_id = saved.id, partial, "updated recipe");
        Ok(saved)
    }

    /// Validates and stores an uploaded image, then points the recipe at it.
    /// Nothing is written unless the bytes decode as an image.
    pub async fn upload_image(
        &self,
        user: &User,
        id: i64,
        upload: Option<&[u8]>,
    ) -> AppResult<Recipe> {
        let mut recipe = self.get_recipe(user, id).await?;

        let bytes = match upload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(AppError::field("image", NO_FILE)),
        };
        let Some(format) = MediaStore::sniff_image(bytes) else {
            debug!(user_id = user.id, recipe_id = id, "rejected non-image upload");
            return Err(AppError::field("image", NOT_AN_IMAGE));
        };

        let path = self.media.save_recipe_image(bytes, format).await?;
        recipe.image = Some(path);
        let saved = self
            .store
            .update_recipe(&recipe)
            .await
            .map_err(missing_as_not_found)?;
        info!(user_id = user.id, recipe_id = saved.id, "stored recipe image");
        Ok(saved)
    }
}
