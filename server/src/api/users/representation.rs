use crate::models::User;
use crate::schema::{subscriptions, users};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// A user as seen by the requester.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requester is subscribed to this user
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Authors among `author_ids` that `viewer_id` is subscribed to.
pub fn subscribed_authors(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    author_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<Uuid> = subscriptions::table
        .filter(subscriptions::subscriber_id.eq(viewer_id))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(conn)?;

    Ok(ids.into_iter().collect())
}

/// Load users by id, ordered by username.
pub fn load_user_responses(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    user_ids: &[Uuid],
) -> QueryResult<Vec<UserResponse>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let loaded: Vec<User> = users::table
        .filter(users::id.eq_any(user_ids))
        .select(User::as_select())
        .order(users::username.asc())
        .load(conn)?;

    let subscribed = subscribed_authors(conn, viewer_id, user_ids)?;

    Ok(loaded
        .into_iter()
        .map(|user| {
            let is_subscribed = subscribed.contains(&user.id);
            UserResponse::new(user, is_subscribed)
        })
        .collect())
}
