use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::jobs::GenerationJob;
use crate::meals::GeneratedMeal;
use crate::storage::{JobStore, JobUpdate};

#[derive(Debug, Clone)]
pub struct StoredNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub job_id: Uuid,
}

/// In-memory store for tests and local runs. Mirrors the Postgres
/// implementation's semantics, including the terminal-row guard.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, GenerationJob>>,
    meals: Mutex<HashMap<Uuid, Vec<GeneratedMeal>>>,
    notifications: Mutex<Vec<StoredNotification>>,
}

impl MemoryJobStore {
    pub fn job(&self, job_id: Uuid) -> Option<GenerationJob> {
        self.jobs.lock().expect("jobs lock").get(&job_id).cloned()
    }

    pub fn meals_for(&self, job_id: Uuid) -> Vec<GeneratedMeal> {
        self.meals
            .lock()
            .expect("meals lock")
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<StoredNotification> {
        self.notifications.lock().expect("notifications lock").clone()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, job: &GenerationJob) -> anyhow::Result<()> {
        self.jobs
            .lock()
            .expect("jobs lock")
            .insert(job.id, job.clone());
        Ok(())
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> anyhow::Result<()> {
        let mut jobs = self.jobs.lock().expect("jobs lock");
        let Some(job) = jobs.get_mut(&job_id) else {
            anyhow::bail!("job not found: {job_id}");
        };
        if job.status.is_terminal() {
            return Ok(());
        }
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(progress) = update.progress {
            job.progress = progress;
        }
        if let Some(step) = update.current_step {
            job.current_step = step;
        }
        if let Some(total) = update.total_meals_generated {
            job.total_meals_generated = total;
        }
        if let Some(message) = update.error_message {
            job.error_message = Some(message);
        }
        job.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<GenerationJob>> {
        Ok(self.job(job_id))
    }

    async fn insert_generated_meals(
        &self,
        job_id: Uuid,
        meals: &[GeneratedMeal],
    ) -> anyhow::Result<()> {
        self.meals
            .lock()
            .expect("meals lock")
            .entry(job_id)
            .or_default()
            .extend_from_slice(meals);
        Ok(())
    }

    async fn insert_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        job_id: Uuid,
    ) -> anyhow::Result<()> {
        self.notifications
            .lock()
            .expect("notifications lock")
            .push(StoredNotification {
                user_id,
                kind: kind.to_string(),
                message: message.to_string(),
                job_id,
            });
        Ok(())
    }
}
