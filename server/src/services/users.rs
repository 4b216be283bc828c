use super::auth::{check_email, check_username, hash, normalize_email};
use crate::error::{AppError, AppResult};
use crate::models::{Recipe, User, UserChanges};
use crate::policy::ensure_self;
use crate::recipe::is_http_url;
use crate::store::Store;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Profile fields a user may change. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

impl ProfilePatch {
    fn into_changes(self) -> AppResult<UserChanges> {
        let username = self.username.map(|u| u.trim().to_string());
        if username.as_deref() == Some("") {
            return Err(AppError::validation("Username cannot be empty"));
        }
        username.as_deref().map(check_username).transpose()?;
        let email = self.email.as_deref().map(normalize_email);
        if email.as_deref() == Some("") {
            return Err(AppError::validation("Email cannot be empty"));
        }
        email.as_deref().map(check_email).transpose()?;
        let avatar = self.avatar.map(|a| a.trim().to_string());
        if avatar.as_deref().is_some_and(|a| !is_http_url(a)) {
            return Err(AppError::validation("Avatar must be a valid URL"));
        }
        let password_hash = match self.password.as_deref() {
            Some("") => return Err(AppError::validation("Password cannot be empty")),
            Some(password) => Some(hash(password)?),
            None => None,
        };
        Ok(UserChanges {
            username,
            email,
            password_hash,
            avatar,
        })
    }
}

pub struct UserService {
    store: Arc<dyn Store>,
    delete_recipes_with_user: bool,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, delete_recipes_with_user: bool) -> Self {
        Self {
            store,
            delete_recipes_with_user,
        }
    }

    pub fn update_profile(&self, caller: &User, id: &str, patch: ProfilePatch) -> AppResult<User> {
        ensure_self(&caller.id, id, "update")?;
        let changes = patch.into_changes()?;
        let user = self.store.update_user(&caller.id, &changes)?;
        tracing::info!(
            user_id = %user.id,
            password_changed = changes.password_hash.is_some(),
            "profile updated"
        );
        Ok(user)
    }

    pub fn delete_account(&self, caller: &User, id: &str) -> AppResult<()> {
        ensure_self(&caller.id, id, "delete")?;
        let removed_recipes = self
            .store
            .delete_user(&caller.id, self.delete_recipes_with_user)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        tracing::info!(user_id = %caller.id, removed_recipes, "account deleted");
        Ok(())
    }

    pub fn list_user_recipes(&self, caller: &User, id: &str) -> AppResult<Vec<Recipe>> {
        ensure_self(&caller.id, id, "view")?;
        Ok(self.store.recipes_by_author(&caller.id)?)
    }
}
