mod memory;
mod monitored;
mod postgres;

pub use memory::{MemoryJobStore, StoredNotification};
pub use monitored::MonitoredStore;
pub use postgres::PgJobStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::jobs::{GenerationJob, JobStatus};
use crate::meals::GeneratedMeal;

/// Partial update applied at a checkpoint. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<i32>,
    pub current_step: Option<String>,
    pub total_meals_generated: Option<i32>,
    pub error_message: Option<String>,
}

/// The persistence boundary the orchestrator depends on. Constructed once at
/// process start and injected as `Arc<dyn JobStore>`; implementations must
/// treat a terminal job's row as read-only.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: &GenerationJob) -> anyhow::Result<()>;
    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> anyhow::Result<()>;
    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<GenerationJob>>;
    async fn insert_generated_meals(
        &self,
        job_id: Uuid,
        meals: &[GeneratedMeal],
    ) -> anyhow::Result<()>;
    async fn insert_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        job_id: Uuid,
    ) -> anyhow::Result<()>;
}
