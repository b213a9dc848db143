//! REST client for the job service.
//!
//! Wraps the service's per-category HTTP endpoints (list, status, results,
//! cancel, delete, start) plus the administrative endpoints using
//! [`reqwest`]. Each call carries its own deadline; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use jobwatch_core::{JobCategory, JobId, JobRecord};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::admin::{ServiceHealth, TerminalLogs};
use crate::config::ClientConfig;
use crate::error::JobServiceError;
use crate::service::{Ack, JobService, ListResponse};
use crate::start::{StartRequest, StartedJob};

/// Deadline for `POST /emergency-restart`.
const RESTART_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for `POST /cancel-all-jobs`.
const CANCEL_ALL_TIMEOUT: Duration = Duration::from_secs(10);

/// What a request is about, used to interpret 400 and 404 responses.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    /// A collection or service-wide endpoint.
    Service,
    /// A single job's status.
    Job(&'a JobId),
    /// A single job's results: 400 means not completed yet.
    Results(&'a JobId),
    /// A command on a single job: 400 means the state forbids it.
    Command(&'a JobId),
}

/// HTTP client for one job service instance.
#[derive(Debug, Clone)]
pub struct JobServiceClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl JobServiceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Service liveness and per-category job counts.
    pub async fn health(&self) -> Result<ServiceHealth, JobServiceError> {
        self.call(
            Method::GET,
            "/health".into(),
            None,
            self.config.request_timeout,
            Target::Service,
        )
        .await
    }

    /// Tail of the remote worker log.
    pub async fn terminal_logs(&self) -> Result<TerminalLogs, JobServiceError> {
        self.call(
            Method::GET,
            "/terminal-logs".into(),
            None,
            self.config.list_timeout,
            Target::Service,
        )
        .await
    }

    pub async fn clear_terminal_logs(&self) -> Result<Ack, JobServiceError> {
        self.call(
            Method::DELETE,
            "/terminal-logs".into(),
            None,
            self.config.command_timeout,
            Target::Service,
        )
        .await
    }

    /// Fire-and-forget restart of the remote workers.
    pub async fn emergency_restart(&self) -> Result<Ack, JobServiceError> {
        self.call(
            Method::POST,
            "/emergency-restart".into(),
            Some(serde_json::json!({})),
            RESTART_TIMEOUT,
            Target::Service,
        )
        .await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    /// Send one request and decode the JSON body of a 2xx response.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
        timeout: Duration,
        target: Target<'_>,
    ) -> Result<T, JobServiceError> {
        tracing::debug!(method = %method, path = %path, "Job service request");

        let mut request = self.client.request(method, self.url(&path)).timeout(timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let response = ensure_success(response, target).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| JobServiceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl JobService for JobServiceClient {
    async fn list(&self, category: JobCategory) -> Result<Vec<JobRecord>, JobServiceError> {
        let path = format!("{}/jobs", category.path_prefix());
        let listing: ListResponse = self
            .call(Method::GET, path, None, self.config.list_timeout, Target::Service)
            .await?;
        Ok(listing.jobs)
    }

    async fn get_status(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<JobRecord, JobServiceError> {
        let path = format!("{}/status/{}", category.path_prefix(), job_id);
        self.call(Method::GET, path, None, self.config.request_timeout, Target::Job(job_id))
            .await
    }

    async fn get_results(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<serde_json::Value, JobServiceError> {
        let path = format!("{}/results/{}", category.path_prefix(), job_id);
        self.call(
            Method::GET,
            path,
            None,
            self.config.request_timeout,
            Target::Results(job_id),
        )
        .await
    }

    async fn cancel(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError> {
        let path = format!("{}/jobs/{}/cancel", category.path_prefix(), job_id);
        self.call(
            Method::POST,
            path,
            None,
            self.config.command_timeout,
            Target::Command(job_id),
        )
        .await
    }

    async fn delete(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError> {
        let path = format!("{}/jobs/{}", category.path_prefix(), job_id);
        self.call(
            Method::DELETE,
            path,
            None,
            self.config.command_timeout,
            Target::Command(job_id),
        )
        .await
    }

    async fn start(&self, request: &StartRequest) -> Result<StartedJob, JobServiceError> {
        let body = serde_json::to_value(request)
            .map_err(|e| JobServiceError::Malformed(e.to_string()))?;
        self.call(
            Method::POST,
            request.category().start_path().to_string(),
            Some(body),
            self.config.request_timeout,
            Target::Service,
        )
        .await
    }

    async fn cancel_all_jobs(&self) -> Result<Ack, JobServiceError> {
        self.call(
            Method::POST,
            "/cancel-all-jobs".into(),
            Some(serde_json::json!({})),
            CANCEL_ALL_TIMEOUT,
            Target::Service,
        )
        .await
    }
}

/// Map a transport-level failure onto the error taxonomy.
fn transport_error(err: reqwest::Error, timeout: Duration) -> JobServiceError {
    if err.is_timeout() {
        JobServiceError::Timeout {
            secs: timeout.as_secs(),
        }
    } else {
        JobServiceError::Unreachable(err.to_string())
    }
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or the matching [`JobServiceError`] with the
/// service's `detail` message on failure.
async fn ensure_success(
    response: reqwest::Response,
    target: Target<'_>,
) -> Result<reqwest::Response, JobServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body, status);

    Err(match (status, target) {
        (
            StatusCode::NOT_FOUND,
            Target::Job(id) | Target::Results(id) | Target::Command(id),
        ) => JobServiceError::NotFound(id.to_string()),
        (StatusCode::BAD_REQUEST, Target::Results(id)) => JobServiceError::NotReady {
            job_id: id.to_string(),
            detail,
        },
        (StatusCode::BAD_REQUEST, Target::Command(id)) => JobServiceError::InvalidState {
            job_id: id.to_string(),
            detail,
        },
        _ => JobServiceError::RemoteError {
            status: status.as_u16(),
            detail,
        },
    })
}

/// Pull the human-readable message out of an error body.
///
/// Error bodies are usually `{"detail": "..."}`; validation failures carry
/// a structured `detail` which is passed through as JSON text. Anything
/// else falls back to the raw body, then to the status reason.
fn extract_detail(body: &str, status: StatusCode) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}
