//! Business operations that sit between the HTTP handlers and the store.
//!
//! Services take already-deserialized input, enforce validation and access
//! rules, and return [`AppError`](crate::error::AppError) on failure.

mod auth;
mod recipes;
mod users;

pub use auth::AuthService;
pub use recipes::{ListQuery, RateRequest, RecipeService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use users::{ProfilePatch, UserService};

use crate::error::{AppError, AppResult};
use crate::ids::ObjectId;

/// Parses a recipe path id. Malformed ids never reach the store.
fn recipe_id(raw: &str) -> AppResult<ObjectId> {
    ObjectId::parse(raw).ok_or_else(recipe_not_found)
}

fn recipe_not_found() -> AppError {
    AppError::NotFound("Recipe not found".to_string())
}
