use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::jobs::JobStatus;
use crate::storage::{JobStore, JobUpdate};

/// The fixed milestones a job moves through. Completion and failure are
/// separate operations on [`JobTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Preparing,
    Generating,
    Saving,
}

impl Checkpoint {
    pub fn progress(&self) -> i32 {
        match self {
            Checkpoint::Preparing => 10,
            Checkpoint::Generating => 30,
            Checkpoint::Saving => 80,
        }
    }

    pub fn step(&self) -> &'static str {
        match self {
            Checkpoint::Preparing => "preparing",
            Checkpoint::Generating => "generating",
            Checkpoint::Saving => "saving",
        }
    }
}

/// Drives a job's externally visible progress. Each checkpoint is one atomic
/// store update; a terminal job swallows further updates so at-least-once
/// delivery of background triggers stays harmless.
pub struct JobTracker {
    store: Arc<dyn JobStore>,
    job_id: Uuid,
}

impl JobTracker {
    pub fn new(store: Arc<dyn JobStore>, job_id: Uuid) -> Self {
        Self { store, job_id }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub async fn advance(&self, checkpoint: Checkpoint) -> anyhow::Result<()> {
        let Some(job) = self.store.fetch_job(self.job_id).await? else {
            anyhow::bail!("job not found: {}", self.job_id);
        };
        if job.status.is_terminal() {
            debug!(job_id = %self.job_id, "ignoring checkpoint for terminal job");
            return Ok(());
        }
        // Progress never moves backward.
        if checkpoint.progress() <= job.progress {
            debug!(job_id = %self.job_id, progress = job.progress, "ignoring stale checkpoint");
            return Ok(());
        }
        self.store
            .update_job(
                self.job_id,
                JobUpdate {
                    status: Some(JobStatus::Processing),
                    progress: Some(checkpoint.progress()),
                    current_step: Some(checkpoint.step().to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn complete(&self, total_meals: i32) -> anyhow::Result<()> {
        let Some(job) = self.store.fetch_job(self.job_id).await? else {
            anyhow::bail!("job not found: {}", self.job_id);
        };
        if job.status.is_terminal() {
            return Ok(());
        }
        self.store
            .update_job(
                self.job_id,
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    progress: Some(100),
                    current_step: Some("completed".to_string()),
                    total_meals_generated: Some(total_meals),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn fail(&self, message: &str) -> anyhow::Result<()> {
        let Some(job) = self.store.fetch_job(self.job_id).await? else {
            anyhow::bail!("job not found: {}", self.job_id);
        };
        if job.status.is_terminal() {
            return Ok(());
        }
        self.store
            .update_job(
                self.job_id,
                JobUpdate {
                    status: Some(JobStatus::Failed),
                    current_step: Some("failed".to_string()),
                    error_message: Some(message.to_string()),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::GenerationJob;
    use crate::storage::MemoryJobStore;
    use time::macros::date;

    async fn tracked_job(store: &Arc<MemoryJobStore>) -> JobTracker {
        let job = GenerationJob::new(Uuid::new_v4(), "Test week".into(), date!(2030 - 01 - 06));
        store.create_job(&job).await.expect("create job");
        JobTracker::new(store.clone() as Arc<dyn JobStore>, job.id)
    }

    #[tokio::test]
    async fn checkpoints_advance_status_and_progress() {
        let store = Arc::new(MemoryJobStore::default());
        let tracker = tracked_job(&store).await;

        tracker.advance(Checkpoint::Preparing).await.expect("preparing");
        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 10);
        assert_eq!(job.current_step, "preparing");

        tracker.advance(Checkpoint::Generating).await.expect("generating");
        tracker.advance(Checkpoint::Saving).await.expect("saving");
        tracker.complete(12).await.expect("complete");

        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.current_step, "completed");
        assert_eq!(job.total_meals_generated, 12);
    }

    #[tokio::test]
    async fn completed_job_rejects_further_updates() {
        let store = Arc::new(MemoryJobStore::default());
        let tracker = tracked_job(&store).await;

        tracker.advance(Checkpoint::Preparing).await.expect("preparing");
        tracker.complete(5).await.expect("complete");

        // At-least-once delivery: a replayed processing update is a no-op.
        tracker.advance(Checkpoint::Generating).await.expect("no-op advance");
        tracker.fail("too late").await.expect("no-op fail");

        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.error_message, None);
    }

    #[tokio::test]
    async fn progress_never_moves_backward() {
        let store = Arc::new(MemoryJobStore::default());
        let tracker = tracked_job(&store).await;

        tracker.advance(Checkpoint::Saving).await.expect("saving");
        tracker.advance(Checkpoint::Preparing).await.expect("stale no-op");

        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.progress, 80);
        assert_eq!(job.current_step, "saving");
    }

    #[tokio::test]
    async fn failure_records_the_message() {
        let store = Arc::new(MemoryJobStore::default());
        let tracker = tracked_job(&store).await;

        tracker.advance(Checkpoint::Generating).await.expect("generating");
        tracker.fail("endpoint unreachable").await.expect("fail");

        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.current_step, "failed");
        assert_eq!(job.error_message.as_deref(), Some("endpoint unreachable"));

        // Terminal: completion afterwards is swallowed.
        tracker.complete(3).await.expect("no-op complete");
        let job = store.job(tracker.job_id()).expect("job exists");
        assert_eq!(job.status, JobStatus::Failed);
    }
}
