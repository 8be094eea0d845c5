pub mod error;
pub mod export;
pub mod recipe;
pub mod reference_data;
pub mod shopping_list;
pub mod store;

pub use error::{AggregateError, ReferenceDataError, StoreError, ValidationError};
pub use export::{
    render_shopping_list, ShoppingListExport, SHOPPING_LIST_CONTENT_TYPE,
    SHOPPING_LIST_FILENAME,
};
pub use recipe::{validate_recipe, IngredientAmount, RecipeDraft};
pub use reference_data::{parse_ingredients, parse_tags, IngredientRecord, TagRecord};
pub use shopping_list::{aggregate_shopping_cart, sum_lines, AggregatedLine, IngredientLine};
pub use store::{MemoryStore, RecipeIngredientStore, ShoppingCartStore};
