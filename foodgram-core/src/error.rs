use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a backing store (database, in-memory fixture, ...).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("recipe {recipe_id} has a non-positive amount {amount} for {ingredient}")]
    InvalidAmount {
        recipe_id: Uuid,
        ingredient: String,
        amount: i64,
    },
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("total amount for {name} ({measurement_unit}) overflowed")]
    Overflow {
        name: String,
        measurement_unit: String,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipe name cannot be empty")]
    EmptyName,

    #[error("Recipe name cannot be longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("Recipe text cannot be empty")]
    EmptyText,

    #[error("At least one ingredient is required")]
    NoIngredients,

    #[error("Ingredient {0} is listed more than once")]
    DuplicateIngredient(Uuid),

    #[error("Amount for ingredient {0} must be at least 1")]
    InvalidAmount(Uuid),

    #[error("Tag {0} is listed more than once")]
    DuplicateTag(Uuid),

    #[error("Cooking time must be at least 1 minute")]
    InvalidCookingTime,
}

#[derive(Error, Debug)]
pub enum ReferenceDataError {
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}
