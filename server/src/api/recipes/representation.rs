//! Full and short recipe representations, loaded in a fixed number of
//! queries regardless of how many recipes are requested.

use crate::api::users::representation::{load_user_responses, UserResponse};
use crate::models::{Recipe, Tag};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart, tags,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortRecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub cooking_time: i32,
}

impl From<Recipe> for ShortRecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            cooking_time: recipe.cooking_time,
        }
    }
}

type IngredientRow = (Uuid, Uuid, String, String, i32);

/// Recipe ids among `recipe_ids` that the user has favorited.
fn favorited_by(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    let ids: Vec<Uuid> = favorites::table
        .filter(favorites::user_id.eq(user_id))
        .filter(favorites::recipe_id.eq_any(recipe_ids))
        .select(favorites::recipe_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Recipe ids among `recipe_ids` that are in the user's shopping cart.
fn in_cart_of(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    let ids: Vec<Uuid> = shopping_cart::table
        .filter(shopping_cart::user_id.eq(user_id))
        .filter(shopping_cart::recipe_id.eq_any(recipe_ids))
        .select(shopping_cart::recipe_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Build full representations for `recipes`, keeping their order.
pub fn load_recipe_responses(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    recipes: Vec<Recipe>,
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<Uuid, UserResponse> = load_user_responses(conn, viewer_id, &author_ids)?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .order(tags::name.asc())
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredientResponse>> = HashMap::new();
    let ingredient_rows: Vec<IngredientRow> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .select((
            recipe_ingredients::recipe_id,
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .order(ingredients::name.asc())
        .load(conn)?;
    for (recipe_id, id, name, measurement_unit, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id,
                name,
                measurement_unit,
                amount,
            });
    }

    let favorited = favorited_by(conn, viewer_id, &recipe_ids)?;
    let in_cart = in_cart_of(conn, viewer_id, &recipe_ids)?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or(diesel::result::Error::NotFound)?;

            Ok(RecipeResponse {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

/// Full representation of a single recipe, or `None` if it doesn't exist.
pub fn load_recipe_response(
    conn: &mut PgConnection,
    viewer_id: Uuid,
    recipe_id: Uuid,
) -> QueryResult<Option<RecipeResponse>> {
    let Some(recipe) = recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };

    Ok(load_recipe_responses(conn, viewer_id, vec![recipe])?.pop())
}
