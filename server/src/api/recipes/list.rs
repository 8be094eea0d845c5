use super::representation::{load_recipe_responses, RecipeResponse};
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "All recipes, newest first", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let rows: Vec<Recipe> = match recipes::table
        .select(Recipe::as_select())
        .order((recipes::created_at.desc(), recipes::id.asc()))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to fetch recipes", e),
    };

    match load_recipe_responses(&mut conn, user.id, rows) {
        Ok(recipes) => (StatusCode::OK, Json(recipes)).into_response(),
        Err(e) => internal_error("Failed to fetch recipes", e),
    }
}
