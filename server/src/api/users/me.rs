use super::representation::UserResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    // Nobody can subscribe to themselves
    (StatusCode::OK, Json(UserResponse::new(user, false)))
}
