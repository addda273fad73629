use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::jobs::{GenerationJob, JobStatus};
use crate::meals::GeneratedMeal;
use crate::storage::{JobStore, JobUpdate};

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    user_id: Uuid,
    plan_name: String,
    week_start: Date,
    status: String,
    progress: i32,
    current_step: String,
    total_meals_generated: i32,
    error_message: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<JobRow> for GenerationJob {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> anyhow::Result<Self> {
        Ok(GenerationJob {
            id: row.id,
            user_id: row.user_id,
            plan_name: row.plan_name,
            week_start: row.week_start,
            status: JobStatus::parse(&row.status)?,
            progress: row.progress,
            current_step: row.current_step,
            total_meals_generated: row.total_meals_generated,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed [`JobStore`]. The terminal-state guard lives in the
/// UPDATE's WHERE clause, so a replayed checkpoint touches zero rows.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create_job(&self, job: &GenerationJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO generation_jobs
                (id, user_id, plan_name, week_start, status, progress, current_step,
                 total_meals_generated, error_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(job.id)
        .bind(job.user_id)
        .bind(&job.plan_name)
        .bind(job.week_start)
        .bind(job.status.as_str())
        .bind(job.progress)
        .bind(&job.current_step)
        .bind(job.total_meals_generated)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .context("insert generation job")?;
        Ok(())
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE generation_jobs SET
                status = COALESCE($2, status),
                progress = COALESCE($3, progress),
                current_step = COALESCE($4, current_step),
                total_meals_generated = COALESCE($5, total_meals_generated),
                error_message = COALESCE($6, error_message),
                updated_at = now()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(job_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.progress)
        .bind(update.current_step)
        .bind(update.total_meals_generated)
        .bind(update.error_message)
        .execute(&self.pool)
        .await
        .context("update generation job")?;
        Ok(())
    }

    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<GenerationJob>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, user_id, plan_name, week_start, status, progress, current_step,
                   total_meals_generated, error_message, created_at, updated_at
            FROM generation_jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .context("fetch generation job")?;
        row.map(GenerationJob::try_from).transpose()
    }

    async fn insert_generated_meals(
        &self,
        job_id: Uuid,
        meals: &[GeneratedMeal],
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin meals tx")?;
        for meal in meals {
            sqlx::query(
                r#"
                INSERT INTO generated_meals
                    (id, job_id, group_id, title, description, prep_time, cook_time,
                     total_time, servings, ingredients, instructions, tags, dietary_info,
                     difficulty, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(meal.id)
            .bind(job_id)
            .bind(meal.group_id)
            .bind(&meal.title)
            .bind(&meal.description)
            .bind(meal.prep_time as i32)
            .bind(meal.cook_time as i32)
            .bind(meal.total_time as i32)
            .bind(meal.servings as i32)
            .bind(serde_json::to_value(&meal.ingredients)?)
            .bind(serde_json::to_value(&meal.instructions)?)
            .bind(serde_json::to_value(&meal.tags)?)
            .bind(serde_json::to_value(&meal.dietary_info)?)
            .bind(meal.difficulty.as_str())
            .bind(meal.created_at)
            .execute(&mut *tx)
            .await
            .context("insert generated meal")?;
        }
        tx.commit().await.context("commit meals tx")?;
        Ok(())
    }

    async fn insert_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        job_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, message, job_id, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .bind(job_id)
        .execute(&self.pool)
        .await
        .context("insert notification")?;
        Ok(())
    }
}
