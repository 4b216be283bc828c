use crate::auth::{hash_password, verify_password, SessionManager};
use crate::error::{AppError, AppResult};
use crate::ids::ObjectId;
use crate::models::{timestamp_now, User};
use crate::store::Store;
use std::sync::Arc;

/// Column widths in the users table.
pub const MAX_USERNAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;

pub struct AuthService {
    store: Arc<dyn Store>,
    sessions: Arc<SessionManager>,
}

/// Emails are matched case-insensitively.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn check_username(username: &str) -> AppResult<()> {
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn check_email(email: &str) -> AppResult<()> {
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::validation(format!(
            "Email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<SessionManager>) -> Self {
        Self { store, sessions }
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let username = username.trim();
        let email = normalize_email(email);
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Username, email and password are required",
            ));
        }
        check_username(username)?;
        check_email(&email)?;

        let now = timestamp_now();
        let user = self.store.insert_user(User {
            id: ObjectId::generate(),
            username: username.to_string(),
            email,
            password_hash: hash(password)?,
            avatar: None,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    /// Returns the user and a freshly signed session token.
    pub fn signin(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let Some(user) = self.store.user_by_email(&email)? else {
            tracing::info!("signin for unknown email");
            return Err(AppError::NotFound("User not found".to_string()));
        };

        if !verify_password(password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "signin with wrong password");
            return Err(AppError::Unauthorized("Wrong credentials".to_string()));
        }

        let token = self.sessions.issue(&user.id)?;
        Ok((user, token))
    }

    /// Resolves a session token to a user that still exists.
    pub fn authenticate(&self, token: &str) -> AppResult<User> {
        let user_id = self.sessions.verify(token)?;
        self.store.user_by_id(&user_id)?.ok_or_else(|| {
            tracing::info!(user_id = %user_id, "session for deleted user");
            AppError::Unauthorized("Unauthorized".to_string())
        })
    }
}
