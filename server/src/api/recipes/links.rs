//! Writes to a recipe's ingredient lines and tag links.

use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, tags};
use diesel::prelude::*;
use foodgram_core::IngredientAmount;
use uuid::Uuid;

/// Name the first kind of reference that points at a row that doesn't exist.
/// Ids are assumed to be unique (validated beforehand).
pub fn missing_reference(
    conn: &mut PgConnection,
    ingredient_ids: &[Uuid],
    tag_ids: &[Uuid],
) -> QueryResult<Option<&'static str>> {
    if !ingredient_ids.is_empty() {
        let found: i64 = ingredients::table
            .filter(ingredients::id.eq_any(ingredient_ids))
            .count()
            .get_result(conn)?;
        if found != ingredient_ids.len() as i64 {
            return Ok(Some("Unknown ingredient"));
        }
    }

    if !tag_ids.is_empty() {
        let found: i64 = tags::table
            .filter(tags::id.eq_any(tag_ids))
            .count()
            .get_result(conn)?;
        if found != tag_ids.len() as i64 {
            return Ok(Some("Unknown tag"));
        }
    }

    Ok(None)
}

pub fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    lines: &[IngredientAmount],
) -> QueryResult<()> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    if lines.is_empty() {
        return Ok(());
    }

    let rows: Vec<NewRecipeIngredient> = lines
        .iter()
        .map(|line| NewRecipeIngredient {
            recipe_id,
            ingredient_id: line.id,
            amount: line.amount,
        })
        .collect();

    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn replace_tags(conn: &mut PgConnection, recipe_id: Uuid, tag_ids: &[Uuid]) -> QueryResult<()> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|tag_id| NewRecipeTag {
            recipe_id,
            tag_id: *tag_id,
        })
        .collect();

    diesel::insert_into(recipe_tags::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}
