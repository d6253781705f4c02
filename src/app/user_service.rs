//! Accounts, credentials, bearer tokens and the admin console's user editing.

use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::token::{generate_token, hash_token};
use crate::domain::email::{is_valid_email, normalize_email};
use crate::domain::model::{NewUser, User};
use crate::domain::payload::{Payload, TextRules};
use crate::error::{AppError, AppResult, NON_FIELD_ERRORS};
use crate::infra::config::AppConfig;
use crate::storage::{Store, StoreError};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};

const EMAIL_RULES: TextRules = TextRules {
    max_len: Some(255),
    min_len: None,
    allow_blank: false,
    trim: true,
};

/// Login fields are only checked for presence.
const CREDENTIAL_RULES: TextRules = TextRules {
    max_len: None,
    min_len: None,
    allow_blank: false,
    trim: false,
};

const INVALID_EMAIL: &str = "Enter a valid email address.";
const EMAIL_TAKEN: &str = "user with this email already exists.";
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

fn email_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict { .. } => AppError::field("email", EMAIL_TAKEN),
        StoreError::Missing { .. } => AppError::NotFound,
        other => other.into(),
    }
}

/// Flags applied when inserting an account.
#[derive(Debug, Clone, Copy)]
struct Flags {
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl Flags {
    const REGULAR: Flags = Flags {
        is_active: true,
        is_staff: false,
        is_superuser: false,
    };
    const SUPERUSER: Flags = Flags {
        is_active: true,
        is_staff: true,
        is_superuser: true,
    };
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    min_password_length: usize,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            store,
            min_password_length: config.min_password_length,
        }
    }

    /// Creates a regular account. The email must be present; no password policy
    /// is applied here (that belongs to the request boundary).
    pub async fn create_user(&self, email: Option<&str>, password: &str) -> AppResult<User> {
        self.insert(email, password, Flags::REGULAR).await
    }

    /// Creates an account with staff and superuser rights.
    pub async fn create_superuser(&self, email: Option<&str>, password: &str) -> AppResult<User> {
        self.insert(email, password, Flags::SUPERUSER).await
    }

    async fn insert(&self, email: Option<&str>, password: &str, flags: Flags) -> AppResult<User> {
        let email = email.map(str::trim).unwrap_or_default();
        if email.is_empty() {
            return Err(AppError::field("email", "Users must have an email address."));
        }

        let user = self
            .store
            .insert_user(NewUser {
                email: normalize_email(email),
                password_hash: hash_password(password)?,
                is_active: flags.is_active,
                is_staff: flags.is_staff,
                is_superuser: flags.is_superuser,
            })
            .await
            .map_err(email_conflict)?;

        info!(user_id = user.id, staff = user.is_staff, "created user");
        Ok(user)
    }

    fn read_email(&self, p: &mut Payload<'_>, required: bool) -> Option<String> {
        let email = p.text("email", required, EMAIL_RULES)?;
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            p.error("email", INVALID_EMAIL);
            return None;
        }
        Some(email)
    }

    fn read_password(&self, p: &mut Payload<'_>, required: bool) -> Option<String> {
        p.text(
            "password",
            required,
            TextRules::password(self.min_password_length),
        )
    }

    /// Public signup: `{email, password}`.
    pub async fn signup(&self, body: &JsonValue) -> AppResult<User> {
        let mut p = Payload::new(body)?;
        let email = self.read_email(&mut p, true);
        let password = self.read_password(&mut p, true);
        p.finish()?;

        match (email, password) {
            (Some(email), Some(password)) => self.create_user(Some(&email), &password).await,
            _ => Err(AppError::field(NON_FIELD_ERRORS, "Invalid signup payload.")),
        }
    }

    /// Returns the account only if it exists, is active and the password matches.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.store.user_by_email(&normalize_email(email)).await? else {
            return Ok(None);
        };
        if !user.is_active {
            debug!(user_id = user.id, "inactive user tried to authenticate");
            return Ok(None);
        }
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Mints a fresh token for `user`, replacing any token issued before.
    pub async fn issue_token(&self, user: &User) -> AppResult<String> {
        let raw = generate_token();
        self.store.replace_token(user.id, &hash_token(&raw)).await?;
        info!(user_id = user.id, "issued auth token");
        Ok(raw)
    }

    /// Token endpoint: `{email, password}` -> token.
    pub async fn obtain_token(&self, body: &JsonValue) -> AppResult<String> {
        let mut p = Payload::new(body)?;
        let email = p.text("email", true, EMAIL_RULES);
        let password = p.text("password", true, CREDENTIAL_RULES);
        p.finish()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::field(NON_FIELD_ERRORS, BAD_CREDENTIALS));
        };
        match self.authenticate(&email, &password).await? {
            Some(user) => self.issue_token(&user).await,
            None => {
                warn!("rejected token request with bad credentials");
                Err(AppError::field(NON_FIELD_ERRORS, BAD_CREDENTIALS))
            }
        }
    }

    /// Resolves a raw bearer token to its active owner.
    pub async fn user_for_token(&self, raw: &str) -> AppResult<Option<User>> {
        let user = self.store.user_by_token(&hash_token(raw)).await?;
        Ok(user.filter(|u| u.is_active))
    }

    /// Profile update. A full update requires both `email` and `password`.
    pub async fn update_profile(
        &self,
        user: &User,
        body: &JsonValue,
        partial: bool,
    ) -> AppResult<User> {
        let mut p = Payload::new(body)?;
        let email = self.read_email(&mut p, !partial);
        let password = self.read_password(&mut p, !partial);
        p.finish()?;

        let mut updated = user.clone();
        if let Some(email) = email {
            updated.email = email;
        }
        if let Some(password) = password {
            updated.password_hash = hash_password(&password)?;
        }
        let saved = self
            .store
            .update_user(&updated)
            .await
            .map_err(email_conflict)?;
        info!(user_id = saved.id, "updated profile");
        Ok(saved)
    }

    // --- admin console ---

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.store.user_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Admin "add user": `{email, password, is_active?, is_staff?, is_superuser?}`.
    pub async fn admin_create_user(&self, body: &JsonValue) -> AppResult<User> {
        let mut p = Payload::new(body)?;
        let email = self.read_email(&mut p, true);
        let password = self.read_password(&mut p, true);
        let is_active = p.boolean("is_active", false);
        let is_staff = p.boolean("is_staff", false);
        let is_superuser = p.boolean("is_superuser", false);
        p.finish()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::field(NON_FIELD_ERRORS, "Invalid user payload."));
        };
        let flags = Flags {
            is_active: is_active.unwrap_or(true),
            is_staff: is_staff.unwrap_or(false),
            is_superuser: is_superuser.unwrap_or(false),
        };
        self.insert(Some(&email), &password, flags).await
    }

    /// Admin "change user": any subset of the add fields.
    pub async fn admin_update_user(&self, id: i64, body: &JsonValue) -> AppResult<User> {
        let mut user = self.get_user(id).await?;

        let mut p = Payload::new(body)?;
        let email = self.read_email(&mut p, false);
        let password = self.read_password(&mut p, false);
        let is_active = p.boolean("is_active", false);
        let is_staff = p.boolean("is_staff", false);
        let is_superuser = p.boolean("is_superuser", false);
        p.finish()?;

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password) = password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(v) = is_active {
            user.is_active = v;
        }
        if let Some(v) = is_staff {
            user.is_staff = v;
        }
        if let Some(v) = is_superuser {
            user.is_superuser = v;
        }

        let saved = self
            .store
            .update_user(&user)
            .await
            .map_err(email_conflict)?;
        info!(user_id = saved.id, "admin updated user");
        Ok(saved)
    }
}
