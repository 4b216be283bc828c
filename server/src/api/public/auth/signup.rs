use crate::api::AppJson;
use crate::error::{AppResult, ErrorResponse};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(
        content = SignupRequest,
        example = json!({"username": "alice", "email": "alice@example.com", "password": "pw123"})
    ),
    responses(
        (status = 201, description = "User created successfully", body = String),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<&'static str>)> {
    state
        .auth
        .signup(&req.username, &req.email, &req.password)?;
    Ok((StatusCode::CREATED, Json("User created successfully")))
}
