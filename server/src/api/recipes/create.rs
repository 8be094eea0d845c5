use super::links::{missing_reference, replace_ingredients, replace_tags};
use super::representation::{load_recipe_response, RecipeResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::NewRecipe;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use foodgram_core::{validate_recipe, IngredientAmount, RecipeDraft};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct RecipeIngredientRequest {
    /// Ingredient ID
    pub id: Uuid,
    pub amount: i32,
}

impl From<RecipeIngredientRequest> for IngredientAmount {
    fn from(request: RecipeIngredientRequest) -> Self {
        IngredientAmount {
            id: request.id,
            amount: request.amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<RecipeIngredientRequest>,
    /// Tag IDs
    #[serde(default)]
    pub tags: Vec<Uuid>,
    pub name: String,
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let ingredients: Vec<IngredientAmount> =
        request.ingredients.iter().copied().map(Into::into).collect();

    let draft = RecipeDraft {
        name: &request.name,
        text: &request.text,
        cooking_time: request.cooking_time,
        ingredients: &ingredients,
        tags: &request.tags,
    };
    if let Err(e) = validate_recipe(&draft) {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let mut conn = get_conn!(pool);

    let ingredient_ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();
    match missing_reference(&mut conn, &ingredient_ids, &request.tags) {
        Ok(None) => {}
        Ok(Some(message)) => return error_response(StatusCode::BAD_REQUEST, message),
        Err(e) => return internal_error("Failed to create recipe", e),
    }

    let result: Result<Uuid, diesel::result::Error> = conn.transaction(|conn| {
        let recipe_id: Uuid = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                author_id: user.id,
                name: request.name.trim(),
                text: &request.text,
                cooking_time: request.cooking_time,
            })
            .returning(recipes::id)
            .get_result(conn)?;

        replace_ingredients(conn, recipe_id, &ingredients)?;
        replace_tags(conn, recipe_id, &request.tags)?;

        Ok(recipe_id)
    });

    let recipe_id = match result {
        Ok(id) => id,
        Err(e) => return internal_error("Failed to create recipe", e),
    };

    tracing::info!(%recipe_id, author_id = %user.id, "recipe created");

    match load_recipe_response(&mut conn, user.id, recipe_id) {
        Ok(Some(recipe)) => (StatusCode::CREATED, Json(recipe)).into_response(),
        Ok(None) => internal_error("Failed to load created recipe", recipe_id),
        Err(e) => internal_error("Failed to load created recipe", e),
    }
}
