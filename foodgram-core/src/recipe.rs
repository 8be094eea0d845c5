//! Validation rules for recipe input.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ValidationError;

pub const MAX_RECIPE_NAME_LEN: usize = 200;

/// An ingredient reference with the quantity a recipe needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// A complete recipe as submitted for creation.
#[derive(Debug, Clone)]
pub struct RecipeDraft<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
    pub ingredients: &'a [IngredientAmount],
    pub tags: &'a [Uuid],
}

pub fn validate_recipe(draft: &RecipeDraft<'_>) -> Result<(), ValidationError> {
    validate_name(draft.name)?;
    validate_text(draft.text)?;
    validate_cooking_time(draft.cooking_time)?;
    validate_ingredients(draft.ingredients)?;
    validate_tags(draft.tags)
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            max: MAX_RECIPE_NAME_LEN,
        });
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(())
}

pub fn validate_cooking_time(minutes: i32) -> Result<(), ValidationError> {
    if minutes < 1 {
        return Err(ValidationError::InvalidCookingTime);
    }
    Ok(())
}

/// Ingredients must be non-empty, unique by id, and each amount at least 1.
pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), ValidationError> {
    if ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    for ingredient in ingredients {
        if !seen.insert(ingredient.id) {
            return Err(ValidationError::DuplicateIngredient(ingredient.id));
        }
        if ingredient.amount < 1 {
            return Err(ValidationError::InvalidAmount(ingredient.id));
        }
    }
    Ok(())
}

pub fn validate_tags(tags: &[Uuid]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(tags.len());
    for tag in tags {
        if !seen.insert(*tag) {
            return Err(ValidationError::DuplicateTag(*tag));
        }
    }
    Ok(())
}
