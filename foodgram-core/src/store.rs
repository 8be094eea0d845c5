//! Read-side interfaces the shopping list pipeline consumes.
//!
//! The server implements both traits on top of Postgres; [`MemoryStore`]
//! backs tests and fixtures.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::error::StoreError;
use crate::shopping_list::IngredientLine;

/// Membership of recipes in users' shopping carts.
pub trait ShoppingCartStore {
    /// Recipes currently in the user's cart. Order is not significant.
    fn recipes_in_cart(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
}

/// Ingredient lines of recipes, pre-joined with ingredient reference data.
pub trait RecipeIngredientStore {
    fn lines_for_recipes(
        &mut self,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<IngredientLine>, StoreError>;
}

/// In-memory store holding carts and recipe ingredient lines.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    carts: HashMap<Uuid, BTreeSet<Uuid>>,
    recipes: HashMap<Uuid, Vec<(String, String, u32)>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe with `(name, measurement_unit, amount)` lines.
    pub fn with_recipe(mut self, recipe_id: Uuid, lines: &[(&str, &str, u32)]) -> Self {
        self.recipes.insert(
            recipe_id,
            lines
                .iter()
                .map(|(name, unit, amount)| (name.to_string(), unit.to_string(), *amount))
                .collect(),
        );
        self
    }

    pub fn with_cart_entry(mut self, user_id: Uuid, recipe_id: Uuid) -> Self {
        self.add_to_cart(user_id, recipe_id);
        self
    }

    /// Make every query fail, as an unreachable database would.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Returns false if the recipe was already in the cart.
    pub fn add_to_cart(&mut self, user_id: Uuid, recipe_id: Uuid) -> bool {
        self.carts.entry(user_id).or_default().insert(recipe_id)
    }

    /// Returns false if the recipe was not in the cart.
    pub fn remove_from_cart(&mut self, user_id: Uuid, recipe_id: Uuid) -> bool {
        self.carts
            .get_mut(&user_id)
            .map(|cart| cart.remove(&recipe_id))
            .unwrap_or(false)
    }

    /// Drop a recipe together with every cart entry pointing at it.
    pub fn delete_recipe(&mut self, recipe_id: Uuid) {
        self.recipes.remove(&recipe_id);
        for cart in self.carts.values_mut() {
            cart.remove(&recipe_id);
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::backend(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "memory store marked unavailable",
            )));
        }
        Ok(())
    }
}

impl ShoppingCartStore for MemoryStore {
    fn recipes_in_cart(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        self.check_available()?;
        Ok(self
            .carts
            .get(&user_id)
            .map(|cart| cart.iter().copied().collect())
            .unwrap_or_default())
    }
}

impl RecipeIngredientStore for MemoryStore {
    fn lines_for_recipes(
        &mut self,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<IngredientLine>, StoreError> {
        self.check_available()?;
        let mut lines = Vec::new();
        for recipe_id in recipe_ids {
            let Some(recipe_lines) = self.recipes.get(recipe_id) else {
                continue;
            };
            lines.extend(
                recipe_lines
                    .iter()
                    .map(|(name, unit, amount)| IngredientLine {
                        recipe_id: *recipe_id,
                        name: name.clone(),
                        measurement_unit: unit.clone(),
                        amount: *amount,
                    }),
            );
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_membership_is_unique() {
        let user = Uuid::new_v4();
        let recipe = Uuid::new_v4();
        let mut store = MemoryStore::new();

        assert!(store.add_to_cart(user, recipe));
        assert!(!store.add_to_cart(user, recipe));
        assert_eq!(store.recipes_in_cart(user).unwrap(), vec![recipe]);

        assert!(store.remove_from_cart(user, recipe));
        assert!(!store.remove_from_cart(user, recipe));
        assert!(store.recipes_in_cart(user).unwrap().is_empty());
    }

    #[test]
    fn test_delete_recipe_cascades_to_carts() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let recipe = Uuid::new_v4();
        let mut store = MemoryStore::new()
            .with_recipe(recipe, &[("Flour", "g", 200)])
            .with_cart_entry(alice, recipe)
            .with_cart_entry(bob, recipe);

        store.delete_recipe(recipe);

        assert!(store.recipes_in_cart(alice).unwrap().is_empty());
        assert!(store.recipes_in_cart(bob).unwrap().is_empty());
        assert!(store.lines_for_recipes(&[recipe]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_recipe_has_no_lines() {
        let mut store = MemoryStore::new();
        assert!(store.lines_for_recipes(&[Uuid::new_v4()]).unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_store_fails_every_query() {
        let mut store = MemoryStore::new().unavailable();
        assert!(matches!(
            store.recipes_in_cart(Uuid::new_v4()),
            Err(StoreError::Backend(_))
        ));
        assert!(store.lines_for_recipes(&[]).is_err());
    }
}
