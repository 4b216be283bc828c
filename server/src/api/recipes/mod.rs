pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod rate;
pub mod update;

use crate::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipe endpoints. Reads are public; writes
/// need a session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recipe/create", post(create::create_recipe))
        .route("/api/recipe/get/{id}", get(get::get_recipe))
        .route("/api/recipe/list", get(list::list_recipes))
        .route("/api/recipe/update/{id}", post(update::update_recipe))
        .route("/api/recipe/rate/{id}", post(rate::rate_recipe))
        .route("/api/recipe/delete/{id}", delete(delete::delete_recipe))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        get::get_recipe,
        list::list_recipes,
        update::update_recipe,
        rate::rate_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        crate::recipe::RecipeInput,
        crate::recipe::IngredientInput,
        crate::recipe::RatingInput,
        crate::recipe::RecipePatch,
        crate::services::RateRequest,
        list::ListRecipesResponse,
    ))
)]
pub struct ApiDoc;
