//! The fan-out/fan-in driver behind a generation job.
//!
//! One job runs as one sequential async task: contexts are built, the mode
//! (single combined call vs per-group calls) is picked from the configured
//! thresholds, every call gets bounded retries with exponential backoff, and
//! per-group failures are accumulated instead of aborting the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::error::{ContextError, GenerationIssue, IssueCode, LlmError, ParseError};
use crate::generation::context::{build_contexts, GenerationContext};
use crate::llm::parser::parse_llm_json;
use crate::llm::prompt::{combined_prompt, per_group_prompt, SYSTEM_PROMPT};
use crate::llm::{GenerationRequest, TextGenerator};
use crate::meals::GeneratedMeal;
use crate::plan::{Group, Plan};

/// Meals generated for one group, plus the serving scale the review step
/// needs.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMealOptions {
    pub group_id: Uuid,
    pub group_name: String,
    pub requested_count: u32,
    pub generated_count: usize,
    pub servings_needed: u32,
    pub meals: Vec<GeneratedMeal>,
}

/// Final classification of a run. Partial results (some groups failed but
/// meals exist) come back with `success == false` and a non-empty error
/// list; the caller decides whether partial data is acceptable.
#[derive(Debug, Serialize)]
pub struct GenerationOutcome {
    pub success: bool,
    pub group_meal_options: Vec<GroupMealOptions>,
    pub total_meals_generated: usize,
    pub errors: Vec<GenerationIssue>,
}

impl GenerationOutcome {
    fn failed(issue: GenerationIssue) -> Self {
        Self {
            success: false,
            group_meal_options: Vec::new(),
            total_meals_generated: 0,
            errors: vec![issue],
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("response contained no valid meals")]
    NoValidMeals,
}

pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self { generator, config }
    }

    pub async fn run(&self, plan: &Plan, available_groups: &[Group]) -> GenerationOutcome {
        if available_groups.is_empty() {
            return GenerationOutcome::failed(GenerationIssue::job_level(
                IssueCode::NoGroups,
                "no groups available for generation",
            ));
        }

        let contexts = match build_contexts(plan, available_groups) {
            Ok(contexts) => contexts,
            Err(ContextError::GroupNotFound { group_id }) => {
                return GenerationOutcome::failed(GenerationIssue::for_group(
                    IssueCode::GroupGenerationFailed,
                    group_id,
                    format!("group not found: {group_id}"),
                ));
            }
        };

        let total_requested: u32 = contexts.iter().map(|c| c.meal_count).sum();
        if total_requested == 0 {
            return GenerationOutcome::failed(GenerationIssue::job_level(
                IssueCode::NoMealsRequested,
                "no meals requested across plan groups",
            ));
        }

        let mut issues: Vec<GenerationIssue> = Vec::new();
        let mut targets: Vec<(GenerationContext, u32)> = Vec::new();
        for ctx in contexts {
            let target = ctx.meal_count + self.config.extra_meals;
            if target > self.config.per_group_meal_cap {
                warn!(
                    group_id = %ctx.group_id,
                    target,
                    cap = self.config.per_group_meal_cap,
                    "group excluded: meal target over the per-group cap"
                );
                issues.push(GenerationIssue::for_group(
                    IssueCode::MealLimitExceeded,
                    ctx.group_id,
                    format!(
                        "group {} needs {target} meals including extras, cap is {}",
                        ctx.group_name, self.config.per_group_meal_cap
                    ),
                ));
            } else {
                targets.push((ctx, target));
            }
        }
        if targets.is_empty() {
            return GenerationOutcome {
                success: false,
                group_meal_options: Vec::new(),
                total_meals_generated: 0,
                errors: issues,
            };
        }

        let total_target: u32 = targets.iter().map(|(_, t)| *t).sum();
        let mut use_per_group = total_target > self.config.combined_meal_threshold
            || targets.len() > self.config.combined_group_threshold;
        info!(
            total_target,
            groups = targets.len(),
            per_group = use_per_group,
            "starting meal generation"
        );

        let mut results: Vec<GroupMealOptions> = Vec::new();
        if !use_per_group {
            match self.combined_call(&targets).await {
                Ok(mut by_group) => {
                    for (ctx, _) in &targets {
                        match by_group.remove(&ctx.group_id) {
                            Some(meals) if !meals.is_empty() => {
                                results.push(self.group_result(ctx, meals));
                            }
                            _ => issues.push(GenerationIssue::for_group(
                                IssueCode::ApiFailure,
                                ctx.group_id,
                                format!(
                                    "combined response contained no valid meals for group {}",
                                    ctx.group_name
                                ),
                            )),
                        }
                    }
                }
                Err(CallError::Parse(ParseError::Truncated)) => {
                    // A truncated combined envelope means the request was too
                    // big, not that the endpoint is down: shrink it by
                    // splitting into per-group calls.
                    info!("combined response truncated after retries; falling back to per-group calls");
                    use_per_group = true;
                }
                Err(err) => {
                    issues.push(GenerationIssue::job_level(
                        IssueCode::ApiFailure,
                        format!("combined generation call failed: {err}"),
                    ));
                }
            }
        }

        if use_per_group {
            for (ctx, target) in &targets {
                match self.group_call(ctx, *target).await {
                    Ok(meals) => results.push(self.group_result(ctx, meals)),
                    Err(err) => {
                        error!(group_id = %ctx.group_id, error = %err, "group generation failed");
                        issues.push(GenerationIssue::for_group(
                            IssueCode::ApiFailure,
                            ctx.group_id,
                            format!("generation failed for group {}: {err}", ctx.group_name),
                        ));
                    }
                }
            }
        }

        let total: usize = results.iter().map(|r| r.generated_count).sum();
        let success = total > 0 && issues.is_empty() && results.len() == targets.len();
        GenerationOutcome {
            success,
            group_meal_options: results,
            total_meals_generated: total,
            errors: issues,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.backoff_base_ms * 2u64.pow(attempt.saturating_sub(1)))
    }

    fn group_result(&self, ctx: &GenerationContext, meals: Vec<GeneratedMeal>) -> GroupMealOptions {
        // Assumes a base recipe serves 4 and scales linearly with
        // adult-equivalents.
        let servings_needed = match meals.first().map(|m| m.servings) {
            Some(base) => (base as f64 * ctx.adult_equivalent / 4.0).ceil() as u32,
            None => ctx.adult_equivalent.ceil() as u32,
        };
        GroupMealOptions {
            group_id: ctx.group_id,
            group_name: ctx.group_name.clone(),
            requested_count: ctx.meal_count,
            generated_count: meals.len(),
            servings_needed,
            meals,
        }
    }

    async fn combined_call(
        &self,
        targets: &[(GenerationContext, u32)],
    ) -> Result<HashMap<Uuid, Vec<GeneratedMeal>>, CallError> {
        let refs: Vec<(&GenerationContext, u32)> = targets.iter().map(|(c, t)| (c, *t)).collect();
        let request = GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: combined_prompt(&refs),
            max_tokens: self.config.max_tokens,
        };

        let mut last_err: Option<CallError> = None;
        for attempt in 1..=self.config.max_retries {
            match self.attempt_combined(&request, targets).await {
                Ok(by_group) => return Ok(by_group),
                Err(err) => {
                    warn!(attempt, error = %err, "combined generation attempt failed");
                    let retry = attempt < self.config.max_retries;
                    last_err = Some(err);
                    if retry {
                        sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(CallError::NoValidMeals))
    }

    async fn attempt_combined(
        &self,
        request: &GenerationRequest,
        targets: &[(GenerationContext, u32)],
    ) -> Result<HashMap<Uuid, Vec<GeneratedMeal>>, CallError> {
        let raw = self.generator.generate(request).await?;
        let value = parse_llm_json(&raw)?;

        let mut by_group: HashMap<Uuid, Vec<GeneratedMeal>> = HashMap::new();
        let Some(groups) = value.get("groups").and_then(Value::as_array) else {
            return Err(CallError::NoValidMeals);
        };
        for entry in groups {
            let Some(group_id) = entry
                .get("group_id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            // Ignore ids the model invented.
            if !targets.iter().any(|(c, _)| c.group_id == group_id) {
                continue;
            }
            by_group.insert(group_id, collect_meals(entry.get("meals"), group_id));
        }

        if by_group.values().map(Vec::len).sum::<usize>() == 0 {
            return Err(CallError::NoValidMeals);
        }
        Ok(by_group)
    }

    async fn group_call(
        &self,
        ctx: &GenerationContext,
        target: u32,
    ) -> Result<Vec<GeneratedMeal>, CallError> {
        let request = GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: per_group_prompt(ctx, target),
            max_tokens: self.config.max_tokens,
        };

        let mut last_err: Option<CallError> = None;
        for attempt in 1..=self.config.max_retries {
            match self.attempt_group(&request, ctx.group_id).await {
                Ok(meals) => return Ok(meals),
                Err(err) => {
                    warn!(
                        attempt,
                        group_id = %ctx.group_id,
                        error = %err,
                        "group generation attempt failed"
                    );
                    let retry = attempt < self.config.max_retries;
                    last_err = Some(err);
                    if retry {
                        sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(CallError::NoValidMeals))
    }

    async fn attempt_group(
        &self,
        request: &GenerationRequest,
        group_id: Uuid,
    ) -> Result<Vec<GeneratedMeal>, CallError> {
        let raw = self.generator.generate(request).await?;
        let value = parse_llm_json(&raw)?;
        let meals = collect_meals(value.get("meals"), group_id);
        if meals.is_empty() {
            // Zero valid meals counts as a failed attempt, so it is retried.
            return Err(CallError::NoValidMeals);
        }
        Ok(meals)
    }
}

fn collect_meals(candidates: Option<&Value>, group_id: Uuid) -> Vec<GeneratedMeal> {
    let Some(candidates) = candidates.and_then(Value::as_array) else {
        return Vec::new();
    };
    let meals: Vec<GeneratedMeal> = candidates
        .iter()
        .filter_map(|c| GeneratedMeal::from_candidate(c, group_id))
        .collect();
    let dropped = candidates.len() - meals.len();
    if dropped > 0 {
        warn!(group_id = %group_id, dropped, "dropped invalid recipe candidates");
    }
    meals
}
