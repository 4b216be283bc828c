use crate::api::{AppJson, RecipeResponse};
use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::services::RateRequest;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    post,
    path = "/api/recipe/rate/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID (24 hex characters)")
    ),
    request_body(content = RateRequest, example = json!({"rating": 5, "comment": "Great"})),
    responses(
        (status = 200, description = "Recipe with the caller's rating applied", body = RecipeResponse),
        (status = 400, description = "Rating out of range", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn rate_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<RateRequest>,
) -> AppResult<Json<RecipeResponse>> {
    Ok(Json(state.recipes.rate(&user, &id, request)?.into()))
}
