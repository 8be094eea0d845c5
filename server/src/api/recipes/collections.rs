//! Per-user recipe collections: favorites and the shopping cart share one
//! add/remove contract and differ only in the backing table and messages.

use super::representation::ShortRecipeResponse;
use crate::api::{error_response, internal_error};
use crate::models::{NewCartEntry, NewFavorite, Recipe};
use crate::schema::{favorites, recipes, shopping_cart};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    pub fn name(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "favorites",
            RecipeCollection::ShoppingCart => "shopping cart",
        }
    }

    fn already_present_message(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "Recipe is already in favorites",
            RecipeCollection::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn not_present_message(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "Recipe was not in favorites",
            RecipeCollection::ShoppingCart => "Recipe was not in the shopping cart",
        }
    }

    /// Insert the pair; returns false if it was already there.
    pub fn add(self, conn: &mut PgConnection, user_id: Uuid, recipe_id: Uuid) -> QueryResult<bool> {
        let inserted = match self {
            RecipeCollection::Favorites => diesel::insert_into(favorites::table)
                .values(&NewFavorite { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)?,
            RecipeCollection::ShoppingCart => diesel::insert_into(shopping_cart::table)
                .values(&NewCartEntry { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)?,
        };
        Ok(inserted > 0)
    }

    /// Delete the pair; returns false if it wasn't there.
    pub fn remove(
        self,
        conn: &mut PgConnection,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> QueryResult<bool> {
        let deleted = match self {
            RecipeCollection::Favorites => diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?,
            RecipeCollection::ShoppingCart => diesel::delete(
                shopping_cart::table
                    .filter(shopping_cart::user_id.eq(user_id))
                    .filter(shopping_cart::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?,
        };
        Ok(deleted > 0)
    }
}

fn find_recipe(conn: &mut PgConnection, recipe_id: Uuid) -> QueryResult<Option<Recipe>> {
    recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()
}

/// POST handler body shared by the favorite and shopping cart routes.
pub fn add_recipe(
    collection: RecipeCollection,
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Response {
    let recipe = match find_recipe(conn, recipe_id) {
        Ok(Some(recipe)) => recipe,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch recipe", e),
    };

    match collection.add(conn, user_id, recipe_id) {
        Ok(true) => {
            tracing::debug!(%user_id, %recipe_id, collection = collection.name(), "recipe added");
            (StatusCode::CREATED, Json(ShortRecipeResponse::from(recipe))).into_response()
        }
        Ok(false) => error_response(StatusCode::BAD_REQUEST, collection.already_present_message()),
        Err(e) => internal_error("Failed to add recipe", e),
    }
}

/// DELETE handler body shared by the favorite and shopping cart routes.
pub fn remove_recipe(
    collection: RecipeCollection,
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Response {
    match find_recipe(conn, recipe_id) {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch recipe", e),
    }

    match collection.remove(conn, user_id, recipe_id) {
        Ok(true) => {
            tracing::debug!(%user_id, %recipe_id, collection = collection.name(), "recipe removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error_response(StatusCode::BAD_REQUEST, collection.not_present_message()),
        Err(e) => internal_error("Failed to remove recipe", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_collection() {
        assert!(RecipeCollection::Favorites
            .already_present_message()
            .contains("favorites"));
        assert!(RecipeCollection::ShoppingCart
            .not_present_message()
            .contains("shopping cart"));
        assert_ne!(
            RecipeCollection::Favorites.not_present_message(),
            RecipeCollection::ShoppingCart.not_present_message()
        );
    }
}
