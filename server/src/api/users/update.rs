use crate::api::AppJson;
use crate::auth::AuthUser;
use crate::error::{AppResult, ErrorResponse};
use crate::models::UserProfile;
use crate::services::ProfilePatch;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    post,
    path = "/api/user/update/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID; must be the caller's own")
    ),
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 409, description = "Username or email taken", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn update_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<ProfilePatch>,
) -> AppResult<Json<UserProfile>> {
    let user = state.users.update_profile(&caller, &id, patch)?;
    Ok(Json(UserProfile::from(&user)))
}
