//! User profile endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, User},
};

use super::AuthenticatedUser;

/// Update current user's profile
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated or wrong current password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_my_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Json<User>> {
    let user = state
        .services
        .auth
        .update_profile(claims.user_id, data)
        .await?;
    Ok(Json(user))
}
