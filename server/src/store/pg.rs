//! Postgres store backend.
//!
//! A recipe is one row; its nested collections live in JSONB columns so the
//! whole document is read and written in a single statement.

use super::{
    RecipeEdit, RecipeFilter, RecipeGuard, RecipePage, RecipeStore, Store, StoreResult, UserStore,
};
use crate::db::DbPool;
use crate::error::{AppError, StoreError};
use crate::ids::ObjectId;
use crate::models::{timestamp_now, Category, Cuisine, Difficulty, Recipe, User, UserChanges};
use crate::schema::{recipes, users};
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool
            .get()
            .map_err(|e| StoreError::Backend(format!("database connection failed: {e}")))
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset<'a> {
    username: Option<&'a str>,
    email: Option<&'a str>,
    password_hash: Option<&'a str>,
    avatar: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
struct RecipeRow {
    id: String,
    title: String,
    description: Option<String>,
    servings: i32,
    cook_time: i32,
    ingredients: serde_json::Value,
    instructions: serde_json::Value,
    difficulty: String,
    category: String,
    cuisine: Option<String>,
    tags: serde_json::Value,
    images: serde_json::Value,
    created_by: String,
    ratings: serde_json::Value,
    average_rating: f64,
    total_ratings: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("stored {what} is invalid: {detail}"))
}

fn stored_id(raw: &str) -> StoreResult<ObjectId> {
    ObjectId::parse(raw).ok_or_else(|| corrupt("identifier", raw))
}

fn to_json<T: Serialize>(what: &str, value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| corrupt(what, e))
}

fn from_json<T: DeserializeOwned>(what: &str, value: serde_json::Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| corrupt(what, e))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: stored_id(&row.id)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<&Recipe> for RecipeRow {
    type Error = StoreError;

    fn try_from(recipe: &Recipe) -> StoreResult<Self> {
        Ok(RecipeRow {
            id: recipe.id.to_string(),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            servings: recipe.servings,
            cook_time: recipe.cook_time,
            ingredients: to_json("ingredients", &recipe.ingredients)?,
            instructions: to_json("instructions", &recipe.instructions)?,
            difficulty: recipe.difficulty.as_str().to_string(),
            category: recipe.category.as_str().to_string(),
            cuisine: recipe.cuisine.map(|c| c.as_str().to_string()),
            tags: to_json("tags", &recipe.tags)?,
            images: to_json("images", &recipe.images)?,
            created_by: recipe.created_by.to_string(),
            ratings: to_json("ratings", &recipe.ratings)?,
            average_rating: recipe.average_rating,
            total_ratings: recipe.total_ratings,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        })
    }
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = StoreError;

    fn try_from(row: RecipeRow) -> StoreResult<Self> {
        Ok(Recipe {
            id: stored_id(&row.id)?,
            title: row.title,
            description: row.description,
            servings: row.servings,
            cook_time: row.cook_time,
            ingredients: from_json("ingredients", row.ingredients)?,
            instructions: from_json("instructions", row.instructions)?,
            difficulty: row.difficulty.parse::<Difficulty>().map_err(|e| corrupt("difficulty", e))?,
            category: row.category.parse::<Category>().map_err(|e| corrupt("category", e))?,
            cuisine: row
                .cuisine
                .map(|c| c.parse::<Cuisine>())
                .transpose()
                .map_err(|e| corrupt("cuisine", e))?,
            tags: from_json("tags", row.tags)?,
            images: from_json("images", row.images)?,
            created_by: stored_id(&row.created_by)?,
            ratings: from_json("ratings", row.ratings)?,
            average_rating: row.average_rating,
            total_ratings: row.total_ratings,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Client-facing field behind a unique constraint from the users migration.
fn conflict_field(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        "users_username_key" => Some("username"),
        "users_email_key" => Some("email"),
        _ => None,
    }
}

fn map_write_error(err: DieselError) -> StoreError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &err {
        if let Some(field) = conflict_field(info.constraint_name()) {
            return StoreError::Conflict { field };
        }
    }
    StoreError::Backend(err.to_string())
}

fn map_read_error(err: DieselError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Error type for closures run inside a locking transaction.
enum TxError {
    Db(DieselError),
    Store(StoreError),
    Rejected(AppError),
}

impl From<DieselError> for TxError {
    fn from(err: DieselError) -> Self {
        TxError::Db(err)
    }
}

impl From<StoreError> for TxError {
    fn from(err: StoreError) -> Self {
        TxError::Store(err)
    }
}

impl From<TxError> for AppError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Db(e) => StoreError::Backend(e.to_string()).into(),
            TxError::Store(e) => e.into(),
            TxError::Rejected(e) => e,
        }
    }
}

fn filtered(filter: &RecipeFilter) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();
    if let Some(category) = filter.category {
        query = query.filter(recipes::category.eq(category.as_str()));
    }
    if let Some(cuisine) = filter.cuisine {
        query = query.filter(recipes::cuisine.eq(cuisine.as_str()));
    }
    if let Some(tag) = &filter.tag {
        query = query.filter(recipes::tags.contains(serde_json::json!([tag])));
    }
    query
}

fn load_recipes(rows: Vec<RecipeRow>) -> StoreResult<Vec<Recipe>> {
    rows.into_iter().map(Recipe::try_from).collect()
}

impl UserStore for PgStore {
    fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut conn = self.conn()?;
        let row: UserRow = diesel::insert_into(users::table)
            .values(UserRow::from(&user))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .map_err(map_write_error)?;
        User::try_from(row)
    }

    fn user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        users::table
            .find(id.as_str())
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(map_read_error)?
            .map(User::try_from)
            .transpose()
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(map_read_error)?
            .map(User::try_from)
            .transpose()
    }

    fn update_user(&self, id: &ObjectId, changes: &UserChanges) -> StoreResult<User> {
        let mut conn = self.conn()?;
        let changeset = UserChangeset {
            username: changes.username.as_deref(),
            email: changes.email.as_deref(),
            password_hash: changes.password_hash.as_deref(),
            avatar: changes.avatar.as_deref(),
            updated_at: timestamp_now(),
        };
        let row: Option<UserRow> = diesel::update(users::table.find(id.as_str()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(map_write_error)?;
        row.ok_or(StoreError::NotFound).and_then(User::try_from)
    }
}

impl RecipeStore for PgStore {
    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<Recipe> {
        let mut conn = self.conn()?;
        let row = RecipeRow::try_from(&recipe)?;
        let row: RecipeRow = diesel::insert_into(recipes::table)
            .values(&row)
            .returning(RecipeRow::as_returning())
            .get_result(&mut conn)
            .map_err(map_write_error)?;
        Recipe::try_from(row)
    }

    fn recipe_by_id(&self, id: &ObjectId) -> StoreResult<Option<Recipe>> {
        let mut conn = self.conn()?;
        recipes::table
            .find(id.as_str())
            .select(RecipeRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(map_read_error)?
            .map(Recipe::try_from)
            .transpose()
    }

    fn recipes_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Recipe>> {
        let mut conn = self.conn()?;
        let rows = recipes::table
            .filter(recipes::created_by.eq(author.as_str()))
            .order((recipes::created_at.desc(), recipes::id.desc()))
            .select(RecipeRow::as_select())
            .load(&mut conn)
            .map_err(map_read_error)?;
        load_recipes(rows)
    }

    fn list_recipes(&self, filter: &RecipeFilter) -> StoreResult<RecipePage> {
        let mut conn = self.conn()?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .map_err(map_read_error)?;
        let rows = filtered(filter)
            .order((recipes::created_at.desc(), recipes::id.desc()))
            .limit(filter.limit)
            .offset(filter.offset)
            .select(RecipeRow::as_select())
            .load(&mut conn)
            .map_err(map_read_error)?;
        Ok(RecipePage {
            recipes: load_recipes(rows)?,
            total,
        })
    }

    fn modify_recipe(&self, id: &ObjectId, edit: RecipeEdit<'_>) -> Result<Option<Recipe>, AppError> {
        let mut conn = self.conn()?;
        let result = conn.transaction::<_, TxError, _>(|conn| {
            let Some(row) = recipes::table
                .find(id.as_str())
                .select(RecipeRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let mut recipe = Recipe::try_from(row)?;
            edit(&mut recipe).map_err(TxError::Rejected)?;

            let updated = RecipeRow::try_from(&recipe)?;
            let stored: RecipeRow = diesel::update(recipes::table.find(id.as_str()))
                .set(&updated)
                .returning(RecipeRow::as_returning())
                .get_result(conn)?;
            Ok(Some(Recipe::try_from(stored)?))
        });
        result.map_err(AppError::from)
    }

    fn delete_recipe(&self, id: &ObjectId, guard: RecipeGuard<'_>) -> Result<bool, AppError> {
        let mut conn = self.conn()?;
        let result = conn.transaction::<_, TxError, _>(|conn| {
            let Some(row) = recipes::table
                .find(id.as_str())
                .select(RecipeRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
            else {
                return Ok(false);
            };

            let recipe = Recipe::try_from(row)?;
            guard(&recipe).map_err(TxError::Rejected)?;

            diesel::delete(recipes::table.find(id.as_str())).execute(conn)?;
            Ok(true)
        });
        result.map_err(AppError::from)
    }
}

impl Store for PgStore {
    fn delete_user(&self, id: &ObjectId, with_recipes: bool) -> StoreResult<Option<usize>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, DieselError, _>(|conn| {
            let deleted = diesel::delete(users::table.find(id.as_str())).execute(conn)?;
            if deleted == 0 {
                return Ok(None);
            }
            if !with_recipes {
                return Ok(Some(0));
            }
            let removed =
                diesel::delete(recipes::table.filter(recipes::created_by.eq(id.as_str())))
                    .execute(conn)?;
            Ok(Some(removed))
        })
        .map_err(map_write_error)
    }
}
