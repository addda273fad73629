use std::fmt::Write;

use crate::generation::context::GenerationContext;

pub const SYSTEM_PROMPT: &str = "You are a meal planning assistant. You generate \
family-friendly dinner recipes as strict JSON. You never include commentary, \
markdown fences or trailing text around the JSON object.";

const RECIPE_SHAPE: &str = r#"Each meal object must have exactly these fields:
"title", "description", "prep_time" (minutes, integer), "cook_time" (minutes, integer),
"total_time" (= prep_time + cook_time), "servings" (integer), "ingredients"
(array of {"name", "amount" (number), "unit", "category" (one of: produce, protein,
dairy, grains, pantry, spices, frozen, bakery, beverages, other), "notes" (optional)}),
"instructions" (array of strings), "tags" (array of strings), "dietary_info"
(array of strings), "difficulty" ("easy", "medium" or "hard")."#;

fn write_group_block(out: &mut String, ctx: &GenerationContext, target_meals: u32) {
    let _ = writeln!(
        out,
        "- group_id: {}\n  name: {}\n  household: {} adults, {} teens, {} kids, {} toddlers (adult-equivalent {})",
        ctx.group_id,
        ctx.group_name,
        ctx.demographics.adults,
        ctx.demographics.teens,
        ctx.demographics.kids,
        ctx.demographics.toddlers,
        ctx.adult_equivalent,
    );
    if ctx.dietary_restrictions.is_empty() {
        let _ = writeln!(out, "  dietary restrictions: none");
    } else {
        let _ = writeln!(
            out,
            "  dietary restrictions (every meal MUST satisfy all of these and list them in dietary_info): {}",
            ctx.dietary_restrictions.join(", ")
        );
    }
    if let Some(notes) = &ctx.notes {
        let _ = writeln!(out, "  notes: {notes}");
    }
    let _ = writeln!(out, "  meals to generate: {target_meals}");
}

/// Prompt for one group. The model must answer with `{"meals": [...]}`.
pub fn per_group_prompt(ctx: &GenerationContext, target_meals: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generate dinner recipes for this household group:\n");
    write_group_block(&mut out, ctx, target_meals);
    let _ = writeln!(out, "\n{RECIPE_SHAPE}");
    let _ = writeln!(
        out,
        "\nRespond with ONLY a JSON object of the form {{\"meals\": [ ... ]}} containing exactly {target_meals} meals."
    );
    out
}

/// Single envelope describing every group at once. The model must answer with
/// `{"groups": [{"group_id": ..., "meals": [...]}]}`.
pub fn combined_prompt(targets: &[(&GenerationContext, u32)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generate dinner recipes for the following {} household groups:\n",
        targets.len()
    );
    for (ctx, target) in targets {
        write_group_block(&mut out, ctx, *target);
    }
    let _ = writeln!(out, "\n{RECIPE_SHAPE}");
    let _ = writeln!(
        out,
        "\nRespond with ONLY a JSON object of the form \
{{\"groups\": [{{\"group_id\": \"...\", \"meals\": [ ... ]}}]}} with one entry per group, \
echoing each group_id exactly as given."
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::Demographics;
    use uuid::Uuid;

    fn ctx(restrictions: Vec<String>) -> GenerationContext {
        let demographics = Demographics {
            adults: 2,
            teens: 1,
            kids: 2,
            toddlers: 0,
        };
        GenerationContext {
            group_id: Uuid::new_v4(),
            group_name: "Family".into(),
            demographics,
            dietary_restrictions: restrictions,
            meal_count: 3,
            notes: Some("no mushrooms".into()),
            adult_equivalent: demographics.adult_equivalent(),
        }
    }

    #[test]
    fn per_group_prompt_names_the_group_and_count() {
        let ctx = ctx(vec!["vegetarian".into()]);
        let prompt = per_group_prompt(&ctx, 5);
        assert!(prompt.contains(&ctx.group_id.to_string()));
        assert!(prompt.contains("vegetarian"));
        assert!(prompt.contains("exactly 5 meals"));
        assert!(prompt.contains("no mushrooms"));
        assert!(prompt.contains("adult-equivalent 4.6"));
    }

    #[test]
    fn combined_prompt_lists_every_group() {
        let a = ctx(vec![]);
        let b = ctx(vec!["vegan".into()]);
        let prompt = combined_prompt(&[(&a, 4), (&b, 6)]);
        assert!(prompt.contains(&a.group_id.to_string()));
        assert!(prompt.contains(&b.group_id.to_string()));
        assert!(prompt.contains("2 household groups"));
        assert!(prompt.contains("\"groups\""));
        assert!(prompt.contains("dietary restrictions: none"));
    }
}
