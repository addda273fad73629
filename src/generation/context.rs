use std::collections::HashMap;

use uuid::Uuid;

use crate::demographics::Demographics;
use crate::error::ContextError;
use crate::plan::{Group, Plan};

/// Everything one group's generation call needs. Ephemeral: built fresh for
/// every attempt, never persisted or mutated in place.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub group_id: Uuid,
    pub group_name: String,
    pub demographics: Demographics,
    pub dietary_restrictions: Vec<String>,
    pub meal_count: u32,
    pub notes: Option<String>,
    pub adult_equivalent: f64,
}

/// One context per plan entry, in the plan's own order. A dangling group
/// reference fails the whole build; this is where decoupled plan validation
/// catches up with reality.
pub fn build_contexts(plan: &Plan, groups: &[Group]) -> Result<Vec<GenerationContext>, ContextError> {
    let by_id: HashMap<Uuid, &Group> = groups.iter().map(|g| (g.id, g)).collect();

    plan.group_meals
        .iter()
        .map(|entry| {
            let group = by_id
                .get(&entry.group_id)
                .ok_or(ContextError::GroupNotFound {
                    group_id: entry.group_id,
                })?;
            Ok(GenerationContext {
                group_id: group.id,
                group_name: group.name.clone(),
                demographics: group.demographics,
                dietary_restrictions: group.dietary_restrictions.clone(),
                meal_count: entry.meal_count,
                notes: entry.notes.clone(),
                adult_equivalent: group.demographics.adult_equivalent(),
            })
        })
        .collect()
}
