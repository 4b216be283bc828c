//! In-memory store backend.
//!
//! Each collection sits behind its own `RwLock`; a write holds the lock for
//! the whole read-modify-write, which gives the same per-document atomicity
//! as the Postgres backend's row locks.

use super::{
    RecipeEdit, RecipeFilter, RecipeGuard, RecipePage, RecipeStore, Store, StoreResult, UserStore,
};
use crate::error::{AppError, StoreError};
use crate::ids::ObjectId;
use crate::models::{timestamp_now, Recipe, User, UserChanges};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<ObjectId, User>>,
    recipes: RwLock<HashMap<ObjectId, Recipe>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn check_unique(
    users: &HashMap<ObjectId, User>,
    skip: Option<&ObjectId>,
    username: Option<&str>,
    email: Option<&str>,
) -> StoreResult<()> {
    for other in users.values().filter(|u| Some(&u.id) != skip) {
        if username.is_some_and(|name| name == other.username) {
            return Err(StoreError::Conflict { field: "username" });
        }
        if email.is_some_and(|email| email == other.email) {
            return Err(StoreError::Conflict { field: "email" });
        }
    }
    Ok(())
}

impl UserStore for MemoryStore {
    fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        check_unique(&users, None, Some(&user.username), Some(&user.email))?;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(id).cloned())
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    fn update_user(&self, id: &ObjectId, changes: &UserChanges) -> StoreResult<User> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        check_unique(
            &users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        )?;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(avatar) = &changes.avatar {
            user.avatar = Some(avatar.clone());
        }
        user.updated_at = timestamp_now();
        Ok(user.clone())
    }
}

impl RecipeStore for MemoryStore {
    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<Recipe> {
        let mut recipes = self.recipes.write().unwrap_or_else(PoisonError::into_inner);
        if recipes.contains_key(&recipe.id) {
            return Err(StoreError::Backend(format!(
                "duplicate recipe id {}",
                recipe.id
            )));
        }
        recipes.insert(recipe.id.clone(), recipe.clone());
        Ok(recipe)
    }

    fn recipe_by_id(&self, id: &ObjectId) -> StoreResult<Option<Recipe>> {
        let recipes = self.recipes.read().unwrap_or_else(PoisonError::into_inner);
        Ok(recipes.get(id).cloned())
    }

    fn recipes_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Recipe>> {
        let recipes = self.recipes.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Recipe> = recipes
            .values()
            .filter(|r| &r.created_by == author)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    fn list_recipes(&self, filter: &RecipeFilter) -> StoreResult<RecipePage> {
        let recipes = self.recipes.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<Recipe> = recipes
            .values()
            .filter(|r| filter.category.is_none_or(|c| r.category == c))
            .filter(|r| filter.cuisine.is_none_or(|c| r.cuisine == Some(c)))
            .filter(|r| {
                filter
                    .tag
                    .as_ref()
                    .is_none_or(|tag| r.tags.iter().any(|t| t == tag))
            })
            .cloned()
            .collect();
        newest_first(&mut matching);

        let total = matching.len() as i64;
        let recipes = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(RecipePage { recipes, total })
    }

    fn modify_recipe(&self, id: &ObjectId, edit: RecipeEdit<'_>) -> Result<Option<Recipe>, AppError> {
        let mut recipes = self.recipes.write().unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = recipes.get_mut(id) else {
            return Ok(None);
        };
        // Edit a copy so a rejected edit leaves the stored document untouched.
        let mut draft = stored.clone();
        edit(&mut draft)?;
        *stored = draft.clone();
        Ok(Some(draft))
    }

    fn delete_recipe(&self, id: &ObjectId, guard: RecipeGuard<'_>) -> Result<bool, AppError> {
        let mut recipes = self.recipes.write().unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = recipes.get(id) else {
            return Ok(false);
        };
        guard(stored)?;
        recipes.remove(id);
        Ok(true)
    }
}

impl Store for MemoryStore {
    fn delete_user(&self, id: &ObjectId, with_recipes: bool) -> StoreResult<Option<usize>> {
        // Lock order: users, then recipes.
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let mut recipes = self.recipes.write().unwrap_or_else(PoisonError::into_inner);
        if users.remove(id).is_none() {
            return Ok(None);
        }
        let before = recipes.len();
        if with_recipes {
            recipes.retain(|_, r| &r.created_by != id);
        }
        Ok(Some(before - recipes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Cuisine};
    use chrono::{Duration, Utc};

    fn user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: ObjectId::generate(),
            username: name.to_string(),
            email: format!("{name}@x.com"),
            password_hash: "hash".into(),
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn recipe(author: &ObjectId, minutes_ago: i64, category: Category) -> Recipe {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Recipe {
            id: ObjectId::generate(),
            title: format!("recipe {minutes_ago}"),
            description: None,
            servings: 1,
            cook_time: 1,
            ingredients: vec![],
            instructions: vec![],
            difficulty: Default::default(),
            category,
            cuisine: Some(Cuisine::Thai),
            tags: vec!["quick".into()],
            images: vec![],
            created_by: author.clone(),
            ratings: vec![],
            average_rating: 0.0,
            total_ratings: 0,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_unique_username_and_email() {
        let store = MemoryStore::new();
        store.insert_user(user("alice")).unwrap();

        let mut dup_name = user("bob");
        dup_name.username = "alice".into();
        assert!(matches!(
            store.insert_user(dup_name),
            Err(StoreError::Conflict { field: "username" })
        ));

        let mut dup_email = user("carol");
        dup_email.email = "alice@x.com".into();
        assert!(matches!(
            store.insert_user(dup_email),
            Err(StoreError::Conflict { field: "email" })
        ));
    }

    #[test]
    fn test_update_user_checks_uniqueness_against_others() {
        let store = MemoryStore::new();
        let alice = store.insert_user(user("alice")).unwrap();
        store.insert_user(user("bob")).unwrap();

        let keep_own_name = UserChanges {
            username: Some("alice".into()),
            ..Default::default()
        };
        assert!(store.update_user(&alice.id, &keep_own_name).is_ok());

        let steal_name = UserChanges {
            username: Some("bob".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(&alice.id, &steal_name),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn test_rejected_edit_leaves_document_unchanged() {
        let store = MemoryStore::new();
        let author = ObjectId::generate();
        let stored = store
            .insert_recipe(recipe(&author, 0, Category::Dinner))
            .unwrap();

        let result = store.modify_recipe(&stored.id, &mut |r: &mut Recipe| -> Result<(), AppError> {
            r.title = "changed".into();
            Err(AppError::Forbidden("no".into()))
        });
        assert!(result.is_err());
        assert_eq!(
            store.recipe_by_id(&stored.id).unwrap().unwrap().title,
            stored.title
        );
    }

    #[test]
    fn test_list_filters_and_paginates_newest_first() {
        let store = MemoryStore::new();
        let author = ObjectId::generate();
        for minutes_ago in 0..5 {
            store
                .insert_recipe(recipe(&author, minutes_ago, Category::Dinner))
                .unwrap();
        }
        store
            .insert_recipe(recipe(&author, 10, Category::Dessert))
            .unwrap();

        let page = store
            .list_recipes(&RecipeFilter {
                category: Some(Category::Dinner),
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.recipes.len(), 2);
        assert_eq!(page.recipes[0].title, "recipe 1");
        assert_eq!(page.recipes[1].title, "recipe 2");
    }

    #[test]
    fn test_delete_user_with_recipes() {
        let store = MemoryStore::new();
        let alice = store.insert_user(user("alice")).unwrap();
        let bob = store.insert_user(user("bob")).unwrap();
        store.insert_recipe(recipe(&alice.id, 0, Category::Soup)).unwrap();
        store.insert_recipe(recipe(&alice.id, 1, Category::Soup)).unwrap();
        store.insert_recipe(recipe(&bob.id, 2, Category::Soup)).unwrap();

        assert_eq!(store.delete_user(&alice.id, true).unwrap(), Some(2));
        assert!(store.user_by_id(&alice.id).unwrap().is_none());
        assert!(store.recipes_by_author(&alice.id).unwrap().is_empty());
        assert_eq!(store.recipes_by_author(&bob.id).unwrap().len(), 1);

        assert_eq!(store.delete_user(&alice.id, true).unwrap(), None);
    }

    #[test]
    fn test_delete_user_keeps_recipes() {
        let store = MemoryStore::new();
        let alice = store.insert_user(user("alice")).unwrap();
        store.insert_recipe(recipe(&alice.id, 0, Category::Soup)).unwrap();

        assert_eq!(store.delete_user(&alice.id, false).unwrap(), Some(0));
        assert_eq!(store.recipes_by_author(&alice.id).unwrap().len(), 1);
    }
}
