use super::representation::{load_user_responses, UserResponse};
use crate::api::recipes::representation::ShortRecipeResponse;
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipes, subscriptions};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// An author the requester follows, with their recipes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: usize,
}

/// Subscription representations for `author_ids`, ordered by username.
pub fn load_subscription_responses(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    author_ids: &[Uuid],
) -> QueryResult<Vec<SubscriptionResponse>> {
    let authors = load_user_responses(conn, viewer_id, author_ids)?;
    if authors.is_empty() {
        return Ok(Vec::new());
    }

    let mut recipes_by_author: HashMap<Uuid, Vec<ShortRecipeResponse>> = HashMap::new();
    let rows: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq_any(author_ids))
        .order((recipes::created_at.desc(), recipes::id.asc()))
        .select(Recipe::as_select())
        .load(conn)?;
    for recipe in rows {
        recipes_by_author
            .entry(recipe.author_id)
            .or_default()
            .push(recipe.into());
    }

    Ok(authors
        .into_iter()
        .map(|user| {
            let recipes = recipes_by_author.remove(&user.id).unwrap_or_default();
            SubscriptionResponse {
                recipes_count: recipes.len(),
                recipes,
                user,
            }
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    responses(
        (status = 200, description = "Authors the current user follows", body = Vec<SubscriptionResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let author_ids: Vec<Uuid> = match subscriptions::table
        .filter(subscriptions::subscriber_id.eq(user.id))
        .select(subscriptions::author_id)
        .load(&mut conn)
    {
        Ok(ids) => ids,
        Err(e) => return internal_error("Failed to fetch subscriptions", e),
    };

    match load_subscription_responses(&mut conn, user.id, &author_ids) {
        Ok(subscriptions) => (StatusCode::OK, Json(subscriptions)).into_response(),
        Err(e) => internal_error("Failed to fetch subscriptions", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_serializes_flat() {
        let response = SubscriptionResponse {
            user: UserResponse {
                id: Uuid::nil(),
                email: "cook@example.com".to_string(),
                username: "cook".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Cook".to_string(),
                is_subscribed: true,
            },
            recipes: vec![ShortRecipeResponse {
                id: Uuid::nil(),
                name: "Pancakes".to_string(),
                cooking_time: 20,
            }],
            recipes_count: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["username"], "cook");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 1);
        assert_eq!(json["recipes"][0]["name"], "Pancakes");
        assert!(json.get("user").is_none());
    }
}
