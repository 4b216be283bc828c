pub mod delete;
pub mod recipes;
pub mod update;

use crate::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/user endpoints. Every route acts on the
/// caller's own account.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/user/update/{id}", post(update::update_user))
        .route("/api/user/delete/{id}", delete(delete::delete_user))
        .route("/api/user/recipes/{id}", get(recipes::list_user_recipes))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        update::update_user,
        delete::delete_user,
        recipes::list_user_recipes,
    ),
    components(schemas(crate::services::ProfilePatch))
)]
pub struct ApiDoc;
