use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::demographics::Demographics;

pub const MAX_GROUP_NAME_LEN: usize = 100;
pub const MAX_ENTRY_NOTES_LEN: usize = 200;
pub const MAX_PLAN_NOTES_LEN: usize = 500;
pub const MAX_MEALS_PER_ENTRY: u32 = 14;
pub const MAX_MEALS_PER_PLAN: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Archived,
}

/// A household group: who is eating, and what they won't eat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub demographics: Demographics,
    pub dietary_restrictions: Vec<String>,
    pub owner: Uuid,
    pub status: GroupStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMealEntry {
    pub group_id: Uuid,
    pub meal_count: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A weekly plan. References groups by id; dangling references are caught at
/// generation time, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub week_start: Date,
    pub group_meals: Vec<GroupMealEntry>,
    #[serde(default)]
    pub notes: Option<String>,
    pub owner: Uuid,
}

pub fn validate_group(group: &Group) -> Vec<String> {
    let mut errors = Vec::new();
    let name = group.name.trim();
    if name.is_empty() {
        errors.push("name must not be blank".to_string());
    } else if name.chars().count() > MAX_GROUP_NAME_LEN {
        errors.push(format!("name must be at most {MAX_GROUP_NAME_LEN} characters"));
    }
    if group.demographics.total_people() == 0 {
        errors.push("group must have at least one person".to_string());
    }
    if group
        .dietary_restrictions
        .iter()
        .any(|r| r.trim().is_empty())
    {
        errors.push("dietary restrictions must not contain blank entries".to_string());
    }
    errors
}

pub fn validate_plan(plan: &Plan) -> Vec<String> {
    let mut errors = Vec::new();
    let name = plan.name.trim();
    if name.is_empty() {
        errors.push("name must not be blank".to_string());
    } else if name.chars().count() > MAX_GROUP_NAME_LEN {
        errors.push(format!("name must be at most {MAX_GROUP_NAME_LEN} characters"));
    }

    if plan.week_start < OffsetDateTime::now_utc().date() {
        errors.push("week start must be today or later".to_string());
    }

    if plan.group_meals.is_empty() {
        errors.push("plan must include at least one group".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    let mut total_meals: u32 = 0;
    for entry in &plan.group_meals {
        if !seen.insert(entry.group_id) {
            errors.push(format!("duplicate group in plan: {}", entry.group_id));
        }
        if entry.meal_count < 1 || entry.meal_count > MAX_MEALS_PER_ENTRY {
            errors.push(format!(
                "meal count for group {} must be between 1 and {MAX_MEALS_PER_ENTRY}",
                entry.group_id
            ));
        }
        if let Some(notes) = &entry.notes {
            if notes.chars().count() > MAX_ENTRY_NOTES_LEN {
                errors.push(format!(
                    "notes for group {} must be at most {MAX_ENTRY_NOTES_LEN} characters",
                    entry.group_id
                ));
            }
        }
        total_meals = total_meals.saturating_add(entry.meal_count);
    }
    if total_meals > MAX_MEALS_PER_PLAN {
        errors.push(format!(
            "plan requests {total_meals} meals, maximum is {MAX_MEALS_PER_PLAN}"
        ));
    }

    if let Some(notes) = &plan.notes {
        if notes.chars().count() > MAX_PLAN_NOTES_LEN {
            errors.push(format!("plan notes must be at most {MAX_PLAN_NOTES_LEN} characters"));
        }
    }
    errors
}
