use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Difficulty, GeneratedMeal, Ingredient, IngredientCategory};

pub const MIN_PREP_TIME: i64 = 0;
pub const MAX_PREP_TIME: i64 = 240;
pub const MIN_SERVINGS: i64 = 1;
pub const MAX_SERVINGS: i64 = 12;

fn non_blank_string(v: Option<&Value>) -> bool {
    matches!(v, Some(Value::String(s)) if !s.trim().is_empty())
}

fn string_array(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .all(|i| matches!(i, Value::String(s) if !s.trim().is_empty())),
        _ => false,
    }
}

fn int_field(v: Option<&Value>) -> Option<i64> {
    v.and_then(Value::as_i64)
}

fn valid_ingredient(v: &Value) -> bool {
    if !non_blank_string(v.get("name")) || !non_blank_string(v.get("unit")) {
        return false;
    }
    match v.get("amount").and_then(Value::as_f64) {
        Some(amount) if amount > 0.0 => {}
        _ => return false,
    }
    match v.get("category").and_then(Value::as_str) {
        Some(cat) if IngredientCategory::ALL.contains(&cat) => {}
        _ => return false,
    }
    match v.get("notes") {
        None | Some(Value::Null) | Some(Value::String(_)) => true,
        _ => false,
    }
}

/// Structural check of one generated recipe candidate. Pure predicate:
/// malformed input yields `false`, never a panic. Candidates that fail are
/// dropped by the orchestrator, not surfaced to the user.
pub fn is_valid_recipe(candidate: &Value) -> bool {
    if !candidate.is_object() {
        return false;
    }
    if !non_blank_string(candidate.get("title")) || !non_blank_string(candidate.get("description"))
    {
        return false;
    }

    let prep = match int_field(candidate.get("prep_time")) {
        Some(p) if (MIN_PREP_TIME..=MAX_PREP_TIME).contains(&p) => p,
        _ => return false,
    };
    let cook = match int_field(candidate.get("cook_time")) {
        Some(c) if c >= 0 => c,
        _ => return false,
    };
    // Strict identity, not a tolerance check.
    match int_field(candidate.get("total_time")) {
        Some(total) if total == prep + cook => {}
        _ => return false,
    }
    match int_field(candidate.get("servings")) {
        Some(s) if (MIN_SERVINGS..=MAX_SERVINGS).contains(&s) => {}
        _ => return false,
    }

    match candidate.get("ingredients") {
        Some(Value::Array(items)) if !items.is_empty() => {
            if !items.iter().all(valid_ingredient) {
                return false;
            }
        }
        _ => return false,
    }
    match candidate.get("instructions") {
        Some(Value::Array(items)) if !items.is_empty() => {
            if !items
                .iter()
                .all(|i| matches!(i, Value::String(s) if !s.trim().is_empty()))
            {
                return false;
            }
        }
        _ => return false,
    }

    if !string_array(candidate.get("tags")) || !string_array(candidate.get("dietary_info")) {
        return false;
    }
    matches!(
        candidate.get("difficulty").and_then(Value::as_str),
        Some("easy" | "medium" | "hard")
    )
}

#[derive(Debug, Deserialize)]
struct RecipeCandidate {
    title: String,
    description: String,
    prep_time: u32,
    cook_time: u32,
    total_time: u32,
    servings: u32,
    ingredients: Vec<Ingredient>,
    instructions: Vec<String>,
    tags: Vec<String>,
    dietary_info: Vec<String>,
    difficulty: Difficulty,
}

impl GeneratedMeal {
    /// Validate a candidate and, if it holds up, stamp it with an id, its
    /// group and a creation time.
    pub fn from_candidate(candidate: &Value, group_id: Uuid) -> Option<GeneratedMeal> {
        if !is_valid_recipe(candidate) {
            return None;
        }
        let parsed: RecipeCandidate = serde_json::from_value(candidate.clone()).ok()?;
        Some(GeneratedMeal {
            id: Uuid::new_v4(),
            title: parsed.title,
            description: parsed.description,
            prep_time: parsed.prep_time,
            cook_time: parsed.cook_time,
            total_time: parsed.total_time,
            servings: parsed.servings,
            ingredients: parsed.ingredients,
            instructions: parsed.instructions,
            tags: parsed.tags,
            dietary_info: parsed.dietary_info,
            difficulty: parsed.difficulty,
            group_id,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}
