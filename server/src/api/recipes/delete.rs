use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    delete,
    path = "/api/recipe/delete/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Recipe deleted", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<String>> {
    let id = state.recipes.delete(&user, &id)?;
    Ok(Json(format!("Recipe id:{id} has been deleted")))
}
