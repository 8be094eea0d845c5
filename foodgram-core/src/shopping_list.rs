//! Shopping cart aggregation.
//!
//! Collects every ingredient line of the recipes a user has put in their
//! cart and folds them into one total per `(name, measurement unit)`.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AggregateError, StoreError};
use crate::store::{RecipeIngredientStore, ShoppingCartStore};

/// One ingredient line of a recipe, joined with the ingredient's reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub recipe_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

impl IngredientLine {
    /// Build a line from a stored signed amount, rejecting anything below 1.
    pub fn try_new(
        recipe_id: Uuid,
        name: String,
        measurement_unit: String,
        amount: i32,
    ) -> Result<Self, StoreError> {
        match u32::try_from(amount) {
            Ok(amount) if amount > 0 => Ok(Self {
                recipe_id,
                name,
                measurement_unit,
                amount,
            }),
            _ => Err(StoreError::InvalidAmount {
                recipe_id,
                ingredient: name,
                amount: i64::from(amount),
            }),
        }
    }
}

/// Total quantity of one ingredient across the whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: u64,
}

/// Aggregate the shopping cart of `user_id`.
///
/// The result holds one line per distinct `(name, measurement_unit)` pair,
/// sorted by name and then unit. An empty cart yields an empty list.
pub fn aggregate_shopping_cart<S>(
    store: &mut S,
    user_id: Uuid,
) -> Result<Vec<AggregatedLine>, AggregateError>
where
    S: ShoppingCartStore + RecipeIngredientStore + ?Sized,
{
    let recipe_ids = store.recipes_in_cart(user_id)?;
    if recipe_ids.is_empty() {
        tracing::debug!(%user_id, "shopping cart is empty");
        return Ok(Vec::new());
    }

    let lines = store.lines_for_recipes(&recipe_ids)?;
    tracing::debug!(
        %user_id,
        recipes = recipe_ids.len(),
        lines = lines.len(),
        "aggregating shopping cart"
    );

    sum_lines(lines)
}

type Totals = BTreeMap<(String, String), u64>;

fn add_to_total(
    totals: &mut Totals,
    name: String,
    measurement_unit: String,
    amount: u64,
) -> Result<(), AggregateError> {
    match totals.entry((name, measurement_unit)) {
        Entry::Vacant(slot) => {
            slot.insert(amount);
        }
        Entry::Occupied(mut slot) => match slot.get().checked_add(amount) {
            Some(total) => *slot.get_mut() = total,
            None => {
                let (name, measurement_unit) = slot.key().clone();
                return Err(AggregateError::Overflow {
                    name,
                    measurement_unit,
                });
            }
        },
    }
    Ok(())
}

/// Group lines by `(name, measurement_unit)` and sum their amounts.
pub fn sum_lines<I>(lines: I) -> Result<Vec<AggregatedLine>, AggregateError>
where
    I: IntoIterator<Item = IngredientLine>,
{
    let mut totals = Totals::new();

    for line in lines {
        if line.amount == 0 {
            tracing::warn!(recipe_id = %line.recipe_id, name = %line.name, "skipping zero amount");
            continue;
        }

        add_to_total(&mut totals, line.name, line.measurement_unit, u64::from(line.amount))?;
    }

    Ok(totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| AggregatedLine {
            name,
            measurement_unit,
            total_amount,
        })
        .collect())
}
