//! Who may mutate what.

use crate::error::{AppError, AppResult};
use crate::ids::ObjectId;
use crate::models::Recipe;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        })
    }
}

pub fn can_mutate(caller: &ObjectId, recipe: &Recipe) -> bool {
    *caller == recipe.created_by
}

/// Ownership gate run after the recipe is known to exist.
pub fn ensure_can_mutate(caller: &ObjectId, recipe: &Recipe, mutation: Mutation) -> AppResult<()> {
    if can_mutate(caller, recipe) {
        Ok(())
    } else {
        tracing::warn!(
            caller = %caller,
            recipe_id = %recipe.id,
            owner = %recipe.created_by,
            action = %mutation,
            "denied recipe mutation by non-owner"
        );
        Err(AppError::Forbidden(format!(
            "You can only {mutation} your own recipes"
        )))
    }
}

/// Account routes are only usable on the caller's own account.
pub fn ensure_self(caller: &ObjectId, target: &str, action: &str) -> AppResult<()> {
    if caller.as_str() == target.to_ascii_lowercase() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You can only {action} your own account"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;

    fn recipe_owned_by(owner: &ObjectId) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: ObjectId::generate(),
            title: "Soup".into(),
            description: None,
            servings: 2,
            cook_time: 30,
            ingredients: vec![],
            instructions: vec![],
            difficulty: Default::default(),
            category: Category::Soup,
            cuisine: None,
            tags: vec![],
            images: vec![],
            created_by: owner.clone(),
            ratings: vec![],
            average_rating: 0.0,
            total_ratings: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_can_mutate() {
        let owner = ObjectId::generate();
        let recipe = recipe_owned_by(&owner);
        assert!(can_mutate(&owner, &recipe));
        assert!(ensure_can_mutate(&owner, &recipe, Mutation::Delete).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let owner = ObjectId::generate();
        let other = ObjectId::generate();
        let recipe = recipe_owned_by(&owner);
        assert!(!can_mutate(&other, &recipe));
        let err = ensure_can_mutate(&other, &recipe, Mutation::Update).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("update")));
    }

    #[test]
    fn test_ensure_self() {
        let me = ObjectId::generate();
        assert!(ensure_self(&me, me.as_str(), "update").is_ok());
        assert!(ensure_self(&me, &me.as_str().to_uppercase(), "update").is_ok());
        assert!(matches!(
            ensure_self(&me, "garbage", "delete"),
            Err(AppError::Forbidden(_))
        ));
    }
}
