use crate::api::{AppJson, RecipeResponse};
use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::recipe::RecipeInput;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};

#[utoipa::path(
    post,
    path = "/api/recipe/create",
    tag = "recipes",
    request_body(
        content = RecipeInput,
        example = json!({
            "title": "Pancakes",
            "servings": 4,
            "cookTime": 20,
            "ingredients": [{"name": "flour", "amount": 200, "unit": "g"}],
            "instructions": ["Mix", "Fry"],
            "category": "Breakfast",
            "tags": ["sweet"]
        })
    ),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<RecipeInput>,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let recipe = state.recipes.create(&user, input)?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}
