pub mod media;
pub mod recipe_service;
pub mod user_service;
