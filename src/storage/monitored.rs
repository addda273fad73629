use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::jobs::GenerationJob;
use crate::meals::GeneratedMeal;
use crate::storage::{JobStore, JobUpdate};

/// Decorator that records per-call latency and failures around any
/// [`JobStore`]. Same interface in, same interface out; wrap at construction
/// time instead of proxying at runtime.
pub struct MonitoredStore<S> {
    inner: S,
}

impl<S: JobStore> MonitoredStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    fn record<T>(
        &self,
        op: &'static str,
        started: Instant,
        result: anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(op, elapsed_ms, "store call"),
            Err(e) => error!(op, elapsed_ms, error = %e, "store call failed"),
        }
        result
    }
}

#[async_trait]
impl<S: JobStore> JobStore for MonitoredStore<S> {
    async fn create_job(&self, job: &GenerationJob) -> anyhow::Result<()> {
        let started = Instant::now();
        let result = self.inner.create_job(job).await;
        self.record("create_job", started, result)
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> anyhow::Result<()> {
        let started = Instant::now();
        let result = self.inner.update_job(job_id, update).await;
        self.record("update_job", started, result)
    }

    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<GenerationJob>> {
        let started = Instant::now();
        let result = self.inner.fetch_job(job_id).await;
        self.record("fetch_job", started, result)
    }

    async fn insert_generated_meals(
        &self,
        job_id: Uuid,
        meals: &[GeneratedMeal],
    ) -> anyhow::Result<()> {
        let started = Instant::now();
        let result = self.inner.insert_generated_meals(job_id, meals).await;
        self.record("insert_generated_meals", started, result)
    }

    async fn insert_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        job_id: Uuid,
    ) -> anyhow::Result<()> {
        let started = Instant::now();
        let result = self
            .inner
            .insert_notification(user_id, kind, message, job_id)
            .await;
        self.record("insert_notification", started, result)
    }
}
