pub mod auth;
pub mod error;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod admin;
    pub mod attrs;
    pub mod common;
    pub mod health;
    pub mod recipes;
    pub mod user;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
