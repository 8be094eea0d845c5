use super::create::RecipeIngredientRequest;
use super::links::{missing_reference, replace_ingredients, replace_tags};
use super::representation::{load_recipe_response, RecipeResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::RecipeChanges;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use foodgram_core::recipe::{
    validate_cooking_time, validate_ingredients, validate_name, validate_tags, validate_text,
};
use foodgram_core::{IngredientAmount, ValidationError};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Partial update. `ingredients` and `tags`, when given, replace the
/// recipe's existing lists.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<RecipeIngredientRequest>>,
    pub tags: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

impl UpdateRecipeRequest {
    fn validate(&self, ingredients: Option<&[IngredientAmount]>) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(text) = &self.text {
            validate_text(text)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        if let Some(ingredients) = ingredients {
            validate_ingredients(ingredients)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    let ingredients: Option<Vec<IngredientAmount>> = request
        .ingredients
        .as_ref()
        .map(|lines| lines.iter().copied().map(Into::into).collect());

    if let Err(e) = request.validate(ingredients.as_deref()) {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let mut conn = get_conn!(pool);

    // Only the author may edit; anyone else sees the recipe as missing
    let owned = recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::author_id.eq(user.id))
        .select(recipes::id)
        .first::<Uuid>(&mut conn)
        .optional();
    match owned {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to update recipe", e),
    }

    let ingredient_ids: Vec<Uuid> = ingredients
        .iter()
        .flatten()
        .map(|ingredient| ingredient.id)
        .collect();
    let tag_ids = request.tags.as_deref().unwrap_or_default();
    match missing_reference(&mut conn, &ingredient_ids, tag_ids) {
        Ok(None) => {}
        Ok(Some(message)) => return error_response(StatusCode::BAD_REQUEST, message),
        Err(e) => return internal_error("Failed to update recipe", e),
    }

    let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
        diesel::update(recipes::table.find(id))
            .set(&RecipeChanges {
                name: request.name.as_deref().map(str::trim),
                text: request.text.as_deref(),
                cooking_time: request.cooking_time,
                updated_at: Utc::now(),
            })
            .execute(conn)?;

        if let Some(ingredients) = &ingredients {
            replace_ingredients(conn, id, ingredients)?;
        }
        if let Some(tags) = &request.tags {
            replace_tags(conn, id, tags)?;
        }
        Ok(())
    });

    if let Err(e) = result {
        return internal_error("Failed to update recipe", e);
    }

    match load_recipe_response(&mut conn, user.id, id) {
        Ok(Some(recipe)) => (StatusCode::OK, Json(recipe)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => internal_error("Failed to load updated recipe", e),
    }
}
