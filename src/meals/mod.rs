mod model;
pub mod validate;

pub use model::{Difficulty, GeneratedMeal, Ingredient, IngredientCategory};
