//! Document store abstraction.
//!
//! Two backends implement these traits: [`PgStore`] (diesel over Postgres) and
//! [`MemoryStore`] (process-local, used by tests and when no database is
//! configured). Read-modify-write operations take a closure that runs while
//! the document is locked, so ownership checks, merges and derived-field
//! refreshes land in one atomic write.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::error::{AppError, StoreError};
use crate::ids::ObjectId;
use crate::models::{Category, Cuisine, Recipe, User, UserChanges};

pub type StoreResult<T> = Result<T, StoreError>;

/// Mutation run against a locked recipe. Returning an error aborts the write.
pub type RecipeEdit<'a> = &'a mut dyn FnMut(&mut Recipe) -> Result<(), AppError>;

/// Check run against a locked recipe before it is removed.
pub type RecipeGuard<'a> = &'a mut dyn FnMut(&Recipe) -> Result<(), AppError>;

pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] on a duplicate username or email.
    fn insert_user(&self, user: User) -> StoreResult<User>;

    fn user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>>;

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Applies `changes` and stamps `updated_at`. Fails with
    /// [`StoreError::NotFound`] if the user is gone.
    fn update_user(&self, id: &ObjectId, changes: &UserChanges) -> StoreResult<User>;
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub category: Option<Category>,
    pub cuisine: Option<Cuisine>,
    pub tag: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    pub total: i64,
}

pub trait RecipeStore: Send + Sync {
    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<Recipe>;

    fn recipe_by_id(&self, id: &ObjectId) -> StoreResult<Option<Recipe>>;

    /// Newest first.
    fn recipes_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Recipe>>;

    /// Newest first, filtered and paginated.
    fn list_recipes(&self, filter: &RecipeFilter) -> StoreResult<RecipePage>;

    /// Locks the recipe, runs `edit`, and persists the result.
    /// `Ok(None)` means the recipe does not exist.
    fn modify_recipe(&self, id: &ObjectId, edit: RecipeEdit<'_>) -> Result<Option<Recipe>, AppError>;

    /// Locks the recipe, runs `guard`, and deletes it if the guard passes.
    /// `Ok(false)` means the recipe does not exist.
    fn delete_recipe(&self, id: &ObjectId, guard: RecipeGuard<'_>) -> Result<bool, AppError>;
}

/// Both collections behind one handle; services hold an `Arc<dyn Store>`.
pub trait Store: UserStore + RecipeStore {
    /// Removes a user and, when `with_recipes` is set, every recipe they
    /// authored, as one write: on error nothing is removed.
    /// Returns the number of recipes removed, or `None` if the user is gone.
    fn delete_user(&self, id: &ObjectId, with_recipes: bool) -> StoreResult<Option<usize>>;
}
