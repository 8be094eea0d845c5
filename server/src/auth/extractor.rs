use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::get_user_from_token;

/// The user behind the request's `Authorization: Bearer <token>` header.
///
/// Handlers take the requesting user explicitly through this extractor:
/// ```ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
/// ```
pub struct AuthUser(pub User);

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingHeader => (StatusCode::UNAUTHORIZED, "Missing Authorization header"),
            AuthError::InvalidHeader => (StatusCode::UNAUTHORIZED, "Invalid Authorization header"),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            // The token may well be valid; don't tell the client to drop it
            AuthError::Unavailable => (StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable"),
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Pull the bearer token out of the request headers.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let pool = Arc::<DbPool>::from_ref(state);

        let user = match get_user_from_token(&pool, token) {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::InvalidToken),
            Err(e) => {
                tracing::error!("Failed to authenticate request: {:#}", e);
                return Err(AuthError::Unavailable);
            }
        };

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/recipes");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc123"))), Ok("abc123"));
        assert_eq!(
            bearer_token(&parts_with(None)),
            Err(AuthError::MissingHeader)
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Token abc123"))),
            Err(AuthError::InvalidFormat)
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer   "))),
            Err(AuthError::InvalidFormat)
        );
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(
            AuthError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
