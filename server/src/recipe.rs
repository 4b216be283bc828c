//! Recipe document rules: input validation, patch merging and derived fields.
//!
//! Every write path goes through [`refresh_derived`] so that `averageRating`,
//! `totalRatings` and `updatedAt` are persisted together with the content they
//! describe.

use crate::error::{AppError, AppResult};
use crate::ids::ObjectId;
use crate::models::{Category, Cuisine, Difficulty, Ingredient, Rating, Recipe};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;
use utoipa::ToSchema;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_SERVINGS: i32 = 100;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

static IMAGE_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("Invalid image URL regex"));

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientInput {
    #[serde(default)]
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    /// Defaults to the caller.
    #[serde(default)]
    pub user_id: Option<ObjectId>,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a create request. Server-owned fields sent by clients are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub servings: i32,
    pub cook_time: i32,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub category: Category,
    #[serde(default)]
    pub cuisine: Option<Cuisine>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ratings: Vec<RatingInput>,
}

/// Keeps an explicit `null` apart from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of an update request. Absent fields keep their stored value;
/// `null` clears the optional ones.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub servings: Option<i32>,
    pub cook_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientInput>>,
    pub instructions: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Cuisine>)]
    pub cuisine: Option<Option<Cuisine>>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub ratings: Option<Vec<RatingInput>>,
}

/// A patch whose every present field has already been validated.
#[derive(Debug, Clone, Default)]
pub struct ValidPatch {
    title: Option<String>,
    description: Option<Option<String>>,
    servings: Option<i32>,
    cook_time: Option<i32>,
    ingredients: Option<Vec<Ingredient>>,
    instructions: Option<Vec<String>>,
    difficulty: Option<Difficulty>,
    category: Option<Category>,
    cuisine: Option<Option<Cuisine>>,
    tags: Option<Vec<String>>,
    images: Option<Vec<String>>,
    ratings: Option<Vec<Rating>>,
}

/// Validates a create request and builds the document to persist.
pub fn build_recipe(
    id: ObjectId,
    author: &ObjectId,
    input: RecipeInput,
    now: DateTime<Utc>,
) -> AppResult<Recipe> {
    let mut recipe = Recipe {
        id,
        title: validate_title(&input.title)?,
        description: validate_description(input.description.as_deref())?,
        servings: validate_servings(input.servings)?,
        cook_time: validate_cook_time(input.cook_time)?,
        ingredients: validate_ingredients(input.ingredients)?,
        instructions: validate_instructions(input.instructions)?,
        difficulty: input.difficulty.unwrap_or_default(),
        category: input.category,
        cuisine: input.cuisine,
        tags: normalize_tags(input.tags),
        images: validate_images(input.images)?,
        created_by: author.clone(),
        ratings: validate_ratings(input.ratings, author, now)?,
        average_rating: 0.0,
        total_ratings: 0,
        created_at: now,
        updated_at: now,
    };
    refresh_derived(&mut recipe, now);
    Ok(recipe)
}

impl RecipePatch {
    /// Validates every present field. Runs before any store interaction.
    pub fn validate(self, caller: &ObjectId, now: DateTime<Utc>) -> AppResult<ValidPatch> {
        Ok(ValidPatch {
            title: self.title.as_deref().map(validate_title).transpose()?,
            description: self
                .description
                .map(|d| validate_description(d.as_deref()))
                .transpose()?,
            servings: self.servings.map(validate_servings).transpose()?,
            cook_time: self.cook_time.map(validate_cook_time).transpose()?,
            ingredients: self.ingredients.map(validate_ingredients).transpose()?,
            instructions: self.instructions.map(validate_instructions).transpose()?,
            difficulty: self.difficulty,
            category: self.category,
            cuisine: self.cuisine,
            tags: self.tags.map(normalize_tags),
            images: self.images.map(validate_images).transpose()?,
            ratings: self
                .ratings
                .map(|r| validate_ratings(r, caller, now))
                .transpose()?,
        })
    }
}

impl ValidPatch {
    /// Merges onto a stored document and refreshes derived fields.
    pub fn apply(self, recipe: &mut Recipe, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(description) = self.description {
            recipe.description = description;
        }
        if let Some(servings) = self.servings {
            recipe.servings = servings;
        }
        if let Some(cook_time) = self.cook_time {
            recipe.cook_time = cook_time;
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = self.instructions {
            recipe.instructions = instructions;
        }
        if let Some(difficulty) = self.difficulty {
            recipe.difficulty = difficulty;
        }
        if let Some(category) = self.category {
            recipe.category = category;
        }
        if let Some(cuisine) = self.cuisine {
            recipe.cuisine = cuisine;
        }
        if let Some(tags) = self.tags {
            recipe.tags = tags;
        }
        if let Some(images) = self.images {
            recipe.images = images;
        }
        if let Some(ratings) = self.ratings {
            recipe.ratings = ratings;
        }
        refresh_derived(recipe, now);
    }
}

/// Recomputes `averageRating`/`totalRatings` from `ratings` and stamps `updatedAt`.
pub fn refresh_derived(recipe: &mut Recipe, now: DateTime<Utc>) {
    if recipe.ratings.is_empty() {
        recipe.average_rating = 0.0;
        recipe.total_ratings = 0;
    } else {
        let sum: i64 = recipe.ratings.iter().map(|r| r.rating as i64).sum();
        recipe.average_rating = sum as f64 / recipe.ratings.len() as f64;
        recipe.total_ratings = recipe.ratings.len() as i32;
    }
    recipe.updated_at = now;
}

/// Adds or replaces `rating.user_id`'s rating; one rating per user.
pub fn upsert_rating(recipe: &mut Recipe, rating: Rating, now: DateTime<Utc>) {
    match recipe
        .ratings
        .iter_mut()
        .find(|r| r.user_id == rating.user_id)
    {
        Some(existing) => *existing = rating,
        None => recipe.ratings.push(rating),
    }
    refresh_derived(recipe, now);
}

/// URL-friendly form of a title, e.g. `"Mom's Pie!"` -> `"mom-s-pie-"`.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

pub fn validate_rating_value(value: i32) -> AppResult<i32> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

pub fn validate_comment(comment: Option<String>) -> Option<String> {
    trimmed_non_empty(comment)
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: Option<&str>) -> AppResult<Option<String>> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(description.to_string()))
}

fn validate_servings(servings: i32) -> AppResult<i32> {
    if (1..=MAX_SERVINGS).contains(&servings) {
        Ok(servings)
    } else {
        Err(AppError::validation(format!(
            "Servings must be between 1 and {MAX_SERVINGS}"
        )))
    }
}

fn validate_cook_time(cook_time: i32) -> AppResult<i32> {
    if cook_time >= 0 {
        Ok(cook_time)
    } else {
        Err(AppError::validation("Cook time cannot be negative"))
    }
}

fn validate_ingredients(ingredients: Vec<IngredientInput>) -> AppResult<Vec<Ingredient>> {
    if ingredients.is_empty() {
        return Err(AppError::validation(
            "Recipe must have at least one ingredient",
        ));
    }
    ingredients
        .into_iter()
        .enumerate()
        .map(|(i, ingredient)| {
            let position = i + 1;
            let name = ingredient.name.trim();
            if name.is_empty() {
                return Err(AppError::validation(format!(
                    "Ingredient {position} is missing a name"
                )));
            }
            if !ingredient.amount.is_finite() || ingredient.amount < 0.0 {
                return Err(AppError::validation(format!(
                    "Ingredient {position} amount cannot be negative"
                )));
            }
            let unit = ingredient.unit.trim();
            if unit.is_empty() {
                return Err(AppError::validation(format!(
                    "Ingredient {position} is missing a unit"
                )));
            }
            Ok(Ingredient {
                name: name.to_string(),
                amount: ingredient.amount,
                unit: unit.to_string(),
                notes: trimmed_non_empty(ingredient.notes),
            })
        })
        .collect()
}

fn validate_instructions(instructions: Vec<String>) -> AppResult<Vec<String>> {
    if instructions.is_empty() {
        return Err(AppError::validation(
            "Recipe must have at least one instruction",
        ));
    }
    instructions
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            let step = step.trim();
            if step.is_empty() {
                Err(AppError::validation(format!(
                    "Instruction step {} cannot be empty",
                    i + 1
                )))
            } else {
                Ok(step.to_string())
            }
        })
        .collect()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// True for `http://` and `https://` URLs. Shared with user avatars.
pub fn is_http_url(url: &str) -> bool {
    IMAGE_URL_REGEX.is_match(url)
}

fn validate_images(images: Vec<String>) -> AppResult<Vec<String>> {
    images
        .into_iter()
        .map(|url| {
            let url = url.trim().to_string();
            if is_http_url(&url) {
                Ok(url)
            } else {
                Err(AppError::validation("Image must be a valid URL"))
            }
        })
        .collect()
}

fn validate_ratings(
    ratings: Vec<RatingInput>,
    caller: &ObjectId,
    now: DateTime<Utc>,
) -> AppResult<Vec<Rating>> {
    ratings
        .into_iter()
        .map(|r| {
            Ok(Rating {
                user_id: r.user_id.unwrap_or_else(|| caller.clone()),
                rating: validate_rating_value(r.rating)?,
                comment: validate_comment(r.comment),
                created_at: r.created_at.unwrap_or(now),
            })
        })
        .collect()
}

fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
