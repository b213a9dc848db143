//! The job service seam.
//!
//! Everything above the request layer talks to the remote service through
//! [`JobService`], so the orchestrator can be driven by an in-memory fake
//! in tests.

use async_trait::async_trait;
use jobwatch_core::{JobCategory, JobId, JobRecord};
use serde::{Deserialize, Serialize};

use crate::error::JobServiceError;
use crate::start::{StartRequest, StartedJob};

/// Body of `GET P/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse {
    pub jobs: Vec<JobRecord>,
}

/// Acknowledgement of a command such as cancel or delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
    /// Any further fields the service chose to report.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Ack {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            details: serde_json::Map::new(),
        }
    }
}

/// Per-category operations of the remote job service.
///
/// Implementations hold no state about jobs: every call is a remote round
/// trip and no call is retried.
#[async_trait]
pub trait JobService: Send + Sync {
    /// All jobs of `category`, in the service's listing order.
    async fn list(&self, category: JobCategory) -> Result<Vec<JobRecord>, JobServiceError>;

    /// Full record of one job, including its progress.
    async fn get_status(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<JobRecord, JobServiceError>;

    /// Result payload of a completed job.
    async fn get_results(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<serde_json::Value, JobServiceError>;

    async fn cancel(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError>;

    async fn delete(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError>;

    /// Start a job of the request's category.
    async fn start(&self, request: &StartRequest) -> Result<StartedJob, JobServiceError>;

    /// Ask the service to cancel every running job in every category.
    async fn cancel_all_jobs(&self) -> Result<Ack, JobServiceError>;
}
