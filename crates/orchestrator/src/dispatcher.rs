//! Mutating commands against the job service.
//!
//! [`CommandDispatcher`] performs a command through the [`JobService`] and,
//! on success, has the [`PollScheduler`] refresh the affected category at
//! once, so the next snapshot reflects the command. A failed command never
//! touches the registry and its error is surfaced unchanged. Confirmation
//! prompts are the caller's business.

use std::sync::Arc;

use jobwatch_client::{Ack, JobService, JobServiceError, StartRequest, StartedJob};
use jobwatch_core::{JobCategory, JobId};
use jobwatch_events::JobEvent;

use crate::scheduler::PollScheduler;

/// Executes cancel, delete, start and result fetches.
#[derive(Clone)]
pub struct CommandDispatcher {
    scheduler: Arc<PollScheduler>,
}

impl CommandDispatcher {
    pub fn new(scheduler: Arc<PollScheduler>) -> Self {
        Self { scheduler }
    }

    fn service(&self) -> &Arc<dyn JobService> {
        self.scheduler.service()
    }

    pub async fn cancel(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<Ack, JobServiceError> {
        let ack = self.service().cancel(category, job_id).await?;
        tracing::info!(category = %category, job_id = %job_id, "Job cancelled");
        self.refresh_after(category, "cancel").await;
        Ok(ack)
    }

    pub async fn delete(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<Ack, JobServiceError> {
        let ack = self.service().delete(category, job_id).await?;
        tracing::info!(category = %category, job_id = %job_id, "Job deleted");
        self.refresh_after(category, "delete").await;
        Ok(ack)
    }

    /// Fetch a job's results and attach them to its record.
    ///
    /// The payload is returned even when a concurrent refresh has already
    /// dropped the record and there is nothing to attach it to.
    pub async fn get_results(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<serde_json::Value, JobServiceError> {
        let payload = self.service().get_results(category, job_id).await?;
        if self
            .scheduler
            .registry()
            .attach_results(category, job_id, payload.clone())
        {
            self.scheduler.bus().publish(JobEvent::ResultsAttached {
                category,
                job_id: job_id.clone(),
            });
        } else {
            tracing::debug!(
                category = %category,
                job_id = %job_id,
                "Results fetched for untracked job"
            );
        }
        Ok(payload)
    }

    /// Start a job and refresh its category so it is tracked right away.
    pub async fn start(&self, request: &StartRequest) -> Result<StartedJob, JobServiceError> {
        let category = request.category();
        let started = self.service().start(request).await?;
        tracing::info!(
            category = %category,
            job_id = %started.job_id,
            status = %started.status,
            "Job started"
        );
        self.refresh_after(category, "start").await;
        Ok(started)
    }

    /// Cancel every running job on the service, then refresh everything.
    pub async fn cancel_all_running(&self) -> Result<Ack, JobServiceError> {
        let ack = self.service().cancel_all_jobs().await?;
        tracing::info!(message = ?ack.message, "Cancelled all running jobs");
        let failed = self.scheduler.refresh_all().await;
        if !failed.is_empty() {
            tracing::warn!(categories = ?failed, "Refresh after cancel-all incomplete");
        }
        Ok(ack)
    }

    /// Follow-up refresh of a command. Its failure does not fail the
    /// command: the next cycle picks the change up.
    async fn refresh_after(&self, category: JobCategory, command: &'static str) {
        if let Err(e) = self.scheduler.refresh_category(category).await {
            tracing::warn!(
                category = %category,
                command,
                error = %e,
                "Refresh after command failed"
            );
        }
    }
}
