use crate::error::AppResult;
use crate::AppState;
use axum::{extract::State, http::header, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/auth/signout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cookie cleared", body = String)
    )
)]
pub async fn signout(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cleared = state.sessions.cleared_cookie()?;
    Ok((
        [(header::SET_COOKIE, cleared)],
        Json("User has been logged out!"),
    ))
}
