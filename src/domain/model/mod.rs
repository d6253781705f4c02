//! Domain records: user accounts and the owner-scoped recipe entities.

pub mod recipe;
pub mod user;

pub use recipe::{AttrKind, NewRecipe, Recipe, RecipeAttr, RecipeDetail, RecipeFilter};
pub use user::{NewUser, User};
