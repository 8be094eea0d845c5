//! Postgres-backed implementations of the shopping list store traits.

use diesel::prelude::*;
use foodgram_core::{IngredientLine, RecipeIngredientStore, ShoppingCartStore, StoreError};
use uuid::Uuid;

use crate::schema::{ingredients, recipe_ingredients, shopping_cart};

pub struct PgShoppingStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgShoppingStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl ShoppingCartStore for PgShoppingStore<'_> {
    fn recipes_in_cart(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        shopping_cart::table
            .filter(shopping_cart::user_id.eq(user_id))
            .select(shopping_cart::recipe_id)
            .load(&mut *self.conn)
            .map_err(StoreError::backend)
    }
}

impl RecipeIngredientStore for PgShoppingStore<'_> {
    fn lines_for_recipes(
        &mut self,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<IngredientLine>, StoreError> {
        let rows: Vec<(Uuid, String, String, i32)> = recipe_ingredients::table
            .inner_join(ingredients::table)
            .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
            .select((
                recipe_ingredients::recipe_id,
                ingredients::name,
                ingredients::measurement_unit,
                recipe_ingredients::amount,
            ))
            .load(&mut *self.conn)
            .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|(recipe_id, name, measurement_unit, amount)| {
                IngredientLine::try_new(recipe_id, name, measurement_unit, amount)
            })
            .collect()
    }
}
