use crate::api::RecipeResponse;
use crate::error::{AppResult, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/recipe/get/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecipeResponse>> {
    Ok(Json(state.recipes.get(&id)?.into()))
}
