use crate::api::{AppJson, RecipeResponse};
use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::recipe::RecipePatch;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    post,
    path = "/api/recipe/update/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID (24 hex characters)")
    ),
    request_body = RecipePatch,
    responses(
        (status = 200, description = "Updated recipe", body = RecipeResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<RecipePatch>,
) -> AppResult<Json<RecipeResponse>> {
    Ok(Json(state.recipes.update(&user, &id, patch)?.into()))
}
