use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::error::IssueCode;
use crate::generation::orchestrator::Orchestrator;
use crate::jobs::{Checkpoint, GenerationJob, JobTracker};
use crate::llm::TextGenerator;
use crate::meals::GeneratedMeal;
use crate::plan::{Group, Plan};
use crate::storage::JobStore;

/// Everything a generation job needs, constructed once at process start and
/// passed by reference. No module-level singletons.
#[derive(Clone)]
pub struct GenerationDeps {
    pub store: Arc<dyn JobStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub config: GenerationConfig,
}

/// Create the job row and dispatch the run as a detached task. The caller
/// gets the job id back immediately; the handle makes the task's fate
/// observable to whoever wants to await or abort it.
pub async fn spawn_generation(
    deps: GenerationDeps,
    user_id: Uuid,
    plan: Plan,
    groups: Vec<Group>,
) -> anyhow::Result<(Uuid, JoinHandle<()>)> {
    let job = GenerationJob::new(user_id, plan.name.clone(), plan.week_start);
    deps.store.create_job(&job).await?;
    let job_id = job.id;
    info!(job_id = %job_id, plan = %plan.name, "generation job created");

    let handle = tokio::spawn(async move {
        if let Err(err) = run_generation_job(&deps, job_id, user_id, &plan, &groups).await {
            error!(job_id = %job_id, error = %err, "generation job errored");
            // The job must end in a terminal state no matter what failed.
            // Anything escaping to here is outside the per-group taxonomy.
            let message = format!("{}: {err}", IssueCode::UnexpectedError.as_str());
            let tracker = JobTracker::new(deps.store.clone(), job_id);
            if let Err(mark_err) = tracker.fail(&message).await {
                error!(job_id = %job_id, error = %mark_err, "could not mark job as failed");
            }
        }
    });
    Ok((job_id, handle))
}

async fn run_generation_job(
    deps: &GenerationDeps,
    job_id: Uuid,
    user_id: Uuid,
    plan: &Plan,
    groups: &[Group],
) -> anyhow::Result<()> {
    let tracker = JobTracker::new(deps.store.clone(), job_id);
    tracker.advance(Checkpoint::Preparing).await?;

    let orchestrator = Orchestrator::new(deps.generator.clone(), deps.config.clone());
    tracker.advance(Checkpoint::Generating).await?;
    let outcome = orchestrator.run(plan, groups).await;

    if outcome.total_meals_generated == 0 {
        let message = if outcome.errors.is_empty() {
            "generation produced no meals".to_string()
        } else {
            outcome
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code.as_str(), e.message))
                .collect::<Vec<_>>()
                .join("; ")
        };
        tracker.fail(&message).await?;
        return Ok(());
    }

    tracker.advance(Checkpoint::Saving).await?;
    let meals: Vec<GeneratedMeal> = outcome
        .group_meal_options
        .iter()
        .flat_map(|options| options.meals.iter().cloned())
        .collect();
    deps.store.insert_generated_meals(job_id, &meals).await?;

    let message = if outcome.success {
        format!(
            "Generated {} meals for {}",
            outcome.total_meals_generated, plan.name
        )
    } else {
        // Partial results are usable: report completion with the caveats.
        format!(
            "Generated {} meals for {} ({} group issue(s))",
            outcome.total_meals_generated,
            plan.name,
            outcome.errors.len()
        )
    };
    deps.store
        .insert_notification(user_id, "meal_generation_complete", &message, job_id)
        .await?;

    tracker.complete(outcome.total_meals_generated as i32).await?;
    info!(
        job_id = %job_id,
        total = outcome.total_meals_generated,
        success = outcome.success,
        "generation job finished"
    );
    Ok(())
}
