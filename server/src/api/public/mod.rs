pub mod auth;
pub mod health;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup::signup))
        .route("/api/auth/signin", post(auth::signin::signin))
        .route("/api/auth/signout", get(auth::signout::signout))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup::signup,
        auth::signin::signin,
        auth::signout::signout,
        health::health,
    ),
    components(schemas(
        auth::signup::SignupRequest,
        auth::signin::SigninRequest,
        crate::models::UserProfile,
        health::HealthResponse,
    ))
)]
pub struct ApiDoc;
