use super::subscriptions::{load_subscription_responses, SubscriptionResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::NewSubscription;
use crate::schema::{subscriptions, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

fn user_exists(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(users::table.find(user_id))).get_result(conn)
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author's user ID")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription or already subscribed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(author_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match user_exists(&mut conn, author_id) {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => return internal_error("Failed to subscribe", e),
    }

    if author_id == user.id {
        return error_response(StatusCode::BAD_REQUEST, "Cannot subscribe to yourself");
    }

    let inserted = diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            subscriber_id: user.id,
            author_id,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn);

    match inserted {
        Ok(0) => return error_response(StatusCode::BAD_REQUEST, "Already subscribed"),
        Ok(_) => {}
        Err(e) => return internal_error("Failed to subscribe", e),
    }

    tracing::debug!(subscriber_id = %user.id, %author_id, "subscribed");

    match load_subscription_responses(&mut conn, user.id, &[author_id]) {
        Ok(mut found) => match found.pop() {
            Some(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
            None => error_response(StatusCode::NOT_FOUND, "User not found"),
        },
        Err(e) => internal_error("Failed to load subscription", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author's user ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(author_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match user_exists(&mut conn, author_id) {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => return internal_error("Failed to unsubscribe", e),
    }

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::subscriber_id.eq(user.id))
            .filter(subscriptions::author_id.eq(author_id)),
    )
    .execute(&mut conn);

    match deleted {
        Ok(0) => error_response(StatusCode::BAD_REQUEST, "Not subscribed"),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Failed to unsubscribe", e),
    }
}
