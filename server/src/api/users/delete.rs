use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    delete,
    path = "/api/user/delete/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID; must be the caller's own")
    ),
    responses(
        (status = 200, description = "Account deleted; session cookie cleared", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn delete_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.users.delete_account(&caller, &id)?;
    let cleared = state.sessions.cleared_cookie()?;
    Ok((
        [(header::SET_COOKIE, cleared)],
        Json("User has been deleted!"),
    ))
}
