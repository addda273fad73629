use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Produce,
    Protein,
    Dairy,
    Grains,
    Pantry,
    Spices,
    Frozen,
    Bakery,
    Beverages,
    Other,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl IngredientCategory {
    pub const ALL: [&'static str; 10] = [
        "produce",
        "protein",
        "dairy",
        "grains",
        "pantry",
        "spices",
        "frozen",
        "bakery",
        "beverages",
        "other",
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub category: IngredientCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recipe produced by the generator. Immutable once created; the review
/// step's selection flag is the only later mutation, applied outside this
/// crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedMeal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Minutes.
    pub prep_time: u32,
    /// Minutes.
    pub cook_time: u32,
    /// Always `prep_time + cook_time`; enforced by the validator.
    pub total_time: u32,
    pub servings: u32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub tags: Vec<String>,
    pub dietary_info: Vec<String>,
    pub difficulty: Difficulty,
    pub group_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
