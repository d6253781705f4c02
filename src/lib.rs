pub mod app;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::recipe_service::RecipeService;
pub use app::user_service::UserService;
pub use error::{AppError, AppResult};
pub use infra::config::{self, AppConfig};
pub use storage::{MemoryStore, PgStore, Store};
