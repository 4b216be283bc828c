use super::{recipe_id, recipe_not_found};
use crate::error::AppResult;
use crate::ids::ObjectId;
use crate::models::{timestamp_now, Category, Cuisine, Rating, Recipe, User};
use crate::policy::{ensure_can_mutate, Mutation};
use crate::recipe::{
    build_recipe, upsert_rating, validate_comment, validate_rating_value, RecipeInput, RecipePatch,
};
use crate::store::{RecipeFilter, RecipePage, Store};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RateRequest {
    /// 1 to 5
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub category: Option<Category>,
    pub cuisine: Option<Cuisine>,
    /// Matched case-insensitively against the recipe's tags
    pub tag: Option<String>,
    /// Page size (default 20, max 100)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    fn into_filter(self) -> RecipeFilter {
        RecipeFilter {
            category: self.category,
            cuisine: self.cuisine,
            tag: self
                .tag
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

pub struct RecipeService {
    store: Arc<dyn Store>,
}

impl RecipeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn create(&self, author: &User, input: RecipeInput) -> AppResult<Recipe> {
        let recipe = build_recipe(ObjectId::generate(), &author.id, input, timestamp_now())?;
        let recipe = self.store.insert_recipe(recipe)?;
        tracing::info!(recipe_id = %recipe.id, author = %author.id, "recipe created");
        Ok(recipe)
    }

    pub fn get(&self, id: &str) -> AppResult<Recipe> {
        let id = recipe_id(id)?;
        self.store.recipe_by_id(&id)?.ok_or_else(recipe_not_found)
    }

    pub fn list(&self, query: ListQuery) -> AppResult<RecipePage> {
        Ok(self.store.list_recipes(&query.into_filter())?)
    }

    /// Existence is checked before ownership, and the patch is validated
    /// before either.
    pub fn update(&self, caller: &User, id: &str, patch: RecipePatch) -> AppResult<Recipe> {
        let id = recipe_id(id)?;
        let now = timestamp_now();
        let mut patch = Some(patch.validate(&caller.id, now)?);

        let updated = self.store.modify_recipe(&id, &mut |recipe: &mut Recipe| -> AppResult<()> {
            ensure_can_mutate(&caller.id, recipe, Mutation::Update)?;
            if let Some(patch) = patch.take() {
                patch.apply(recipe, now);
            }
            Ok(())
        })?;

        let recipe = updated.ok_or_else(recipe_not_found)?;
        tracing::info!(recipe_id = %recipe.id, "recipe updated");
        Ok(recipe)
    }

    pub fn delete(&self, caller: &User, id: &str) -> AppResult<ObjectId> {
        let id = recipe_id(id)?;
        let deleted = self.store.delete_recipe(&id, &mut |recipe: &Recipe| -> AppResult<()> {
            ensure_can_mutate(&caller.id, recipe, Mutation::Delete)
        })?;
        if !deleted {
            return Err(recipe_not_found());
        }
        tracing::info!(recipe_id = %id, caller = %caller.id, "recipe deleted");
        Ok(id)
    }

    /// Any signed-in user may rate; a second rating from the same user
    /// replaces the first.
    pub fn rate(&self, caller: &User, id: &str, request: RateRequest) -> AppResult<Recipe> {
        let id = recipe_id(id)?;
        let now = timestamp_now();
        let rating = Rating {
            user_id: caller.id.clone(),
            rating: validate_rating_value(request.rating)?,
            comment: validate_comment(request.comment),
            created_at: now,
        };

        let updated = self.store.modify_recipe(&id, &mut |recipe: &mut Recipe| -> AppResult<()> {
            upsert_rating(recipe, rating.clone(), now);
            Ok(())
        })?;
        updated.ok_or_else(recipe_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::{MemoryStore, RecipeStore};
    use chrono::Utc;
    use serde_json::json;

    fn user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: ObjectId::generate(),
            username: name.to_string(),
            email: format!("{name}@x.com"),
            password_hash: String::new(),
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn input(value: serde_json::Value) -> RecipeInput {
        serde_json::from_value(value).unwrap()
    }

    fn pancakes() -> RecipeInput {
        input(json!({
            "title": "Pancakes",
            "servings": 4,
            "cookTime": 20,
            "ingredients": [{"name": "flour", "amount": 200, "unit": "g"}],
            "instructions": ["mix", "fry"],
            "category": "Breakfast",
            "tags": ["Sweet", "quick"]
        }))
    }

    fn service() -> (RecipeService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (RecipeService::new(store.clone()), store)
    }

    #[test]
    fn test_create_sets_author_and_derived_fields() {
        let (recipes, _) = service();
        let alice = user("alice");
        let mut body = pancakes();
        body.ratings = serde_json::from_value(json!([{"rating": 4}, {"rating": 2}])).unwrap();

        let created = recipes.create(&alice, body).unwrap();
        assert_eq!(created.created_by, alice.id);
        assert_eq!(created.total_ratings, 2);
        assert_eq!(created.average_rating, 3.0);
        assert_eq!(created.tags, vec!["sweet", "quick"]);
        assert_eq!(recipes.get(created.id.as_str()).unwrap(), created);
    }

    #[test]
    fn test_written_timestamps_are_microsecond_precision() {
        let (recipes, _) = service();
        let alice = user("alice");
        let bob = user("bob");
        let created = recipes.create(&alice, pancakes()).unwrap();
        let rated = recipes
            .rate(
                &bob,
                created.id.as_str(),
                RateRequest {
                    rating: 5,
                    comment: None,
                },
            )
            .unwrap();

        for at in [
            created.created_at,
            created.updated_at,
            rated.updated_at,
            rated.ratings[0].created_at,
        ] {
            assert_eq!(at.timestamp_subsec_nanos() % 1_000, 0, "{at}");
        }
    }

    #[test]
    fn test_create_requires_ingredients_and_instructions() {
        let (recipes, _) = service();
        let alice = user("alice");

        let mut no_ingredients = pancakes();
        no_ingredients.ingredients.clear();
        assert!(matches!(
            recipes.create(&alice, no_ingredients),
            Err(AppError::Validation(_))
        ));

        let mut no_steps = pancakes();
        no_steps.instructions.clear();
        assert!(matches!(
            recipes.create(&alice, no_steps),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        let (recipes, _) = service();
        let alice = user("alice");
        for bad in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "507f1f77bcf86cd79943901"] {
            assert!(matches!(recipes.get(bad), Err(AppError::NotFound(_))));
            assert!(matches!(
                recipes.update(&alice, bad, RecipePatch::default()),
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(
                recipes.delete(&alice, bad),
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[test]
    fn test_only_owner_can_mutate() {
        let (recipes, _) = service();
        let alice = user("alice");
        let bob = user("bob");
        let created = recipes.create(&alice, pancakes()).unwrap();
        let id = created.id.as_str();

        let patch = RecipePatch {
            title: Some("Stolen".into()),
            ..Default::default()
        };
        assert!(matches!(
            recipes.update(&bob, id, patch.clone()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            recipes.delete(&bob, id),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(recipes.get(id).unwrap(), created);

        let updated = recipes.update(&alice, id, patch).unwrap();
        assert_eq!(updated.title, "Stolen");
        assert_eq!(updated.created_by, alice.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        recipes.delete(&alice, id).unwrap();
        assert!(matches!(recipes.get(id), Err(AppError::NotFound(_))));
        assert!(matches!(
            recipes.delete(&alice, id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_unknown_id_is_not_found_before_forbidden() {
        let (recipes, _) = service();
        let bob = user("bob");
        let missing = ObjectId::generate();
        assert!(matches!(
            recipes.update(&bob, missing.as_str(), RecipePatch::default()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_ratings_recomputes_average() {
        let (recipes, store) = service();
        let alice = user("alice");
        let created = recipes.create(&alice, pancakes()).unwrap();

        let patch: RecipePatch =
            serde_json::from_value(json!({"ratings": [{"rating": 5}, {"rating": 4}, {"rating": 3}]}))
                .unwrap();
        let updated = recipes.update(&alice, created.id.as_str(), patch).unwrap();
        assert_eq!(updated.total_ratings, 3);
        assert_eq!(updated.average_rating, 4.0);

        let stored = store.recipe_by_id(&created.id).unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_rate_upserts_per_user() {
        let (recipes, _) = service();
        let alice = user("alice");
        let bob = user("bob");
        let carol = user("carol");
        let id = recipes.create(&alice, pancakes()).unwrap().id;

        let rate = |who: &User, rating| {
            recipes.rate(
                who,
                id.as_str(),
                RateRequest {
                    rating,
                    comment: None,
                },
            )
        };
        rate(&bob, 2).unwrap();
        rate(&carol, 5).unwrap();
        let rerated = rate(&bob, 4).unwrap();
        assert_eq!(rerated.total_ratings, 2);
        assert_eq!(rerated.average_rating, 4.5);

        assert!(matches!(rate(&bob, 6), Err(AppError::Validation(_))));
        assert!(matches!(rate(&bob, 0), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_list_clamps_paging() {
        let (recipes, _) = service();
        let alice = user("alice");
        for _ in 0..3 {
            recipes.create(&alice, pancakes()).unwrap();
        }

        let page = recipes
            .list(ListQuery {
                limit: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.recipes.len(), 1);

        let page = recipes
            .list(ListQuery {
                tag: Some(" SWEET ".into()),
                limit: Some(1000),
                offset: Some(-5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.recipes.len(), 3);

        let page = recipes
            .list(ListQuery {
                category: Some(Category::Dinner),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
