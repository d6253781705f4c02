//! Centralized configuration (environment variables + defaults).

use std::path::PathBuf;

/// Minimum password length accepted at signup and on profile updates.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

/// Pool size (default: 5).
pub fn database_max_connections() -> u32 {
    std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(5)
        .max(1)
}

/// Listen address (default: `0.0.0.0:8000`).
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string())
}

/// Directory uploaded files are written to (default: `./media`).
pub fn media_root() -> PathBuf {
    std::env::var("MEDIA_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("media"))
}

/// Public URL prefix uploaded files are served under (default: `/media/`).
///
/// Always starts and ends with `/`.
pub fn media_url() -> String {
    let raw = std::env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());
    normalize_url_prefix(&raw)
}

fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Settings shared by the services and handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub media_root: PathBuf,
    pub media_url: String,
    pub min_password_length: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            media_root: media_root(),
            media_url: media_url(),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }

    /// Same defaults as [`AppConfig::from_env`] with an explicit media root.
    pub fn with_media_root(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            media_url: "/media/".to_string(),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}
