use crate::api::AppJson;
use crate::error::{AppResult, ErrorResponse};
use crate::models::UserProfile;
use crate::AppState;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "auth",
    request_body(
        content = SigninRequest,
        example = json!({"email": "alice@example.com", "password": "pw123"})
    ),
    responses(
        (status = 200, description = "Signed in; session cookie set", body = UserProfile,
            headers(("set-cookie" = String, description = "access_token session cookie"))),
        (status = 401, description = "Wrong credentials", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<SigninRequest>,
) -> AppResult<impl IntoResponse> {
    let (user, token) = state.auth.signin(&req.email, &req.password)?;
    let cookie = state.sessions.cookie(&token)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(UserProfile::from(&user))))
}
