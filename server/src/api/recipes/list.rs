use crate::api::{AppQuery, RecipeResponse};
use crate::error::{AppResult, ErrorResponse};
use crate::services::ListQuery;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    /// Matches across all pages
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/recipe/list",
    tag = "recipes",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of recipes, newest first", body = ListRecipesResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<ListRecipesResponse>> {
    let page = state.recipes.list(query)?;
    Ok(Json(ListRecipesResponse {
        recipes: page.recipes.into_iter().map(RecipeResponse::from).collect(),
        total: page.total,
    }))
}
