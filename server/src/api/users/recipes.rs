use crate::api::RecipeResponse;
use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/user/recipes/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID; must be the caller's own")
    ),
    responses(
        (status = 200, description = "Recipes authored by the user, newest first", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn list_user_recipes(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<RecipeResponse>>> {
    let recipes = state.users.list_user_recipes(&caller, &id)?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}
