use rust_decimal::Decimal;
use serde::Serialize;

/// The two kinds of named attribute a recipe links to.
///
/// Tags and ingredients share one shape (`{id, name, owner}`) and one set of
/// rules, so the store and service handle them through this discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Tag,
    Ingredient,
}

impl AttrKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKind::Tag => "tag",
            AttrKind::Ingredient => "ingredient",
        }
    }

    /// Name of the recipe payload field holding ids of this kind.
    pub fn field(&self) -> &'static str {
        match self {
            AttrKind::Tag => "tags",
            AttrKind::Ingredient => "ingredients",
        }
    }
}

/// A tag or ingredient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RecipeAttr {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// A recipe with its relations as id lists.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    /// Path relative to the media root.
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl Recipe {
    pub fn attr_ids(&self, kind: AttrKind) -> &[i64] {
        match kind {
            AttrKind::Tag => &self.tags,
            AttrKind::Ingredient => &self.ingredients,
        }
    }
}

/// A recipe with its relations expanded to full rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub tags: Vec<RecipeAttr>,
    pub ingredients: Vec<RecipeAttr>,
}

/// Validated scalar fields of a new recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// Relation filters for listing recipes.
///
/// Each list is an "any of" match; when both are present a recipe must
/// satisfy both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let any_of = |wanted: &Option<Vec<i64>>, have: &[i64]| match wanted {
            Some(ids) => have.iter().any(|id| ids.contains(id)),
            None => true,
        };
        any_of(&self.tags, &recipe.tags) && any_of(&self.ingredients, &recipe.ingredients)
    }
}
