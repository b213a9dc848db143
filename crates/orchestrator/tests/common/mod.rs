//! In-memory job service shared by the orchestrator integration tests.
//!
//! `FakeJobService` holds one ordered job list per category and behaves
//! like the remote service: listings never carry progress, commands check
//! job state, and failures or delays can be scripted per category.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jobwatch_client::{Ack, JobService, JobServiceError, StartRequest, StartedJob};
use jobwatch_core::{JobCategory, JobId, JobRecord, JobStatus, Progress};
use jobwatch_events::EventBus;
use jobwatch_orchestrator::{PollConfig, PollScheduler};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Default)]
struct State {
    jobs: HashMap<JobCategory, Vec<JobRecord>>,
    progress: HashMap<(JobCategory, String), Progress>,
    list_failures: HashMap<JobCategory, u32>,
    list_delays: HashMap<JobCategory, Vec<Duration>>,
    status_failures: u32,
    list_calls: Vec<(JobCategory, Instant)>,
    status_calls: Vec<(JobCategory, String)>,
    command_calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeJobService {
    state: Mutex<State>,
}

pub fn record(id: &str, status: JobStatus) -> JobRecord {
    let started = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
    JobRecord::new(id, status, started)
}

pub fn progress(current: u64, total: u64) -> Progress {
    Progress {
        message: Some("Processing profiles".into()),
        current: Some(current),
        total: Some(total),
        percentage: Some(current as f64 * 100.0 / total as f64),
        timestamp: None,
    }
}

impl FakeJobService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_jobs(&self, category: JobCategory, jobs: Vec<JobRecord>) {
        self.state.lock().jobs.insert(category, jobs);
    }

    pub fn set_status(&self, category: JobCategory, id: &str, status: JobStatus) {
        let mut state = self.state.lock();
        if let Some(job) = state
            .jobs
            .entry(category)
            .or_default()
            .iter_mut()
            .find(|j| j.job_id == id)
        {
            job.status = status;
        }
    }

    /// Progress reported by `get_status` for one job.
    pub fn set_progress(&self, category: JobCategory, id: &str, progress: Progress) {
        self.state
            .lock()
            .progress
            .insert((category, id.to_string()), progress);
    }

    /// Fail the next `times` listings of `category`.
    pub fn fail_lists(&self, category: JobCategory, times: u32) {
        self.state.lock().list_failures.insert(category, times);
    }

    pub fn fail_all_lists(&self, times: u32) {
        for category in JobCategory::ALL {
            self.fail_lists(category, times);
        }
    }

    /// Delay the next listings of `category`, one entry per call.
    pub fn delay_lists(&self, category: JobCategory, delays: Vec<Duration>) {
        self.state.lock().list_delays.insert(category, delays);
    }

    pub fn fail_statuses(&self, times: u32) {
        self.state.lock().status_failures = times;
    }

    pub fn list_calls(&self) -> Vec<(JobCategory, Instant)> {
        self.state.lock().list_calls.clone()
    }

    pub fn list_count(&self, category: JobCategory) -> usize {
        self.state
            .lock()
            .list_calls
            .iter()
            .filter(|(c, _)| *c == category)
            .count()
    }

    pub fn status_count(&self) -> usize {
        self.state.lock().status_calls.len()
    }

    pub fn command_calls(&self) -> Vec<String> {
        self.state.lock().command_calls.clone()
    }

    fn find(&self, category: JobCategory, job_id: &JobId) -> Option<JobRecord> {
        self.state
            .lock()
            .jobs
            .get(&category)
            .and_then(|jobs| jobs.iter().find(|j| &j.job_id == job_id).cloned())
    }
}

#[async_trait]
impl JobService for FakeJobService {
    async fn list(&self, category: JobCategory) -> Result<Vec<JobRecord>, JobServiceError> {
        let delay = {
            let mut state = self.state.lock();
            state.list_calls.push((category, Instant::now()));
            let delays = state.list_delays.entry(category).or_default();
            (!delays.is_empty()).then(|| delays.remove(0))
        };
        // Snapshot the listing before waiting, like a response already in flight.
        let result = {
            let mut state = self.state.lock();
            let failures = state.list_failures.entry(category).or_default();
            if *failures > 0 {
                *failures -= 1;
                Err(JobServiceError::Unreachable("connection refused".into()))
            } else {
                let jobs = state.jobs.get(&category).cloned().unwrap_or_default();
                Ok(jobs
                    .into_iter()
                    .map(|mut j| {
                        j.progress = None;
                        j
                    })
                    .collect())
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_status(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<JobRecord, JobServiceError> {
        {
            let mut state = self.state.lock();
            state.status_calls.push((category, job_id.to_string()));
            if state.status_failures > 0 {
                state.status_failures -= 1;
                return Err(JobServiceError::Timeout { secs: 60 });
            }
        }
        let mut record = self
            .find(category, job_id)
            .ok_or_else(|| JobServiceError::NotFound(job_id.to_string()))?;
        record.progress = self
            .state
            .lock()
            .progress
            .get(&(category, job_id.to_string()))
            .cloned();
        Ok(record)
    }

    async fn get_results(
        &self,
        category: JobCategory,
        job_id: &JobId,
    ) -> Result<serde_json::Value, JobServiceError> {
        let record = self
            .find(category, job_id)
            .ok_or_else(|| JobServiceError::NotFound(job_id.to_string()))?;
        if record.status != JobStatus::Completed {
            return Err(JobServiceError::NotReady {
                job_id: job_id.to_string(),
                detail: format!("Current status: {}", record.status),
            });
        }
        Ok(serde_json::json!({"job_id": job_id.as_str(), "valid_urls": 12}))
    }

    async fn cancel(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError> {
        let mut state = self.state.lock();
        state.command_calls.push(format!("cancel {category}/{job_id}"));
        let job = state
            .jobs
            .entry(category)
            .or_default()
            .iter_mut()
            .find(|j| &j.job_id == job_id)
            .ok_or_else(|| JobServiceError::NotFound(job_id.to_string()))?;
        if !job.status.is_live() {
            return Err(JobServiceError::InvalidState {
                job_id: job_id.to_string(),
                detail: format!("Job '{job_id}' is already {}", job.status),
            });
        }
        job.status = JobStatus::Cancelled;
        Ok(Ack::with_message(format!("Job '{job_id}' cancelled")))
    }

    async fn delete(&self, category: JobCategory, job_id: &JobId) -> Result<Ack, JobServiceError> {
        let mut state = self.state.lock();
        state.command_calls.push(format!("delete {category}/{job_id}"));
        let jobs = state.jobs.entry(category).or_default();
        let before = jobs.len();
        jobs.retain(|j| &j.job_id != job_id);
        if jobs.len() == before {
            return Err(JobServiceError::NotFound(job_id.to_string()));
        }
        Ok(Ack::with_message(format!("Job '{job_id}' deleted successfully")))
    }

    async fn start(&self, request: &StartRequest) -> Result<StartedJob, JobServiceError> {
        let category = request.category();
        let mut state = self.state.lock();
        let jobs = state.jobs.entry(category).or_default();
        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| JobId::new(format!("{category}_{}", jobs.len() + 1)));
        if jobs.iter().any(|j| j.job_id == job_id) {
            return Err(JobServiceError::RemoteError {
                status: 409,
                detail: format!("Job with ID '{job_id}' already exists"),
            });
        }
        jobs.push(record(job_id.as_str(), JobStatus::Queued));
        state.command_calls.push(format!("start {category}/{job_id}"));
        Ok(StartedJob {
            job_id,
            status: JobStatus::Queued,
            message: "Job started successfully".into(),
        })
    }

    async fn cancel_all_jobs(&self) -> Result<Ack, JobServiceError> {
        let mut state = self.state.lock();
        state.command_calls.push("cancel-all".into());
        let mut cancelled = 0;
        for jobs in state.jobs.values_mut() {
            for job in jobs.iter_mut().filter(|j| j.status.is_live()) {
                job.status = JobStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(Ack::with_message(format!("Cancelled {cancelled} jobs")))
    }
}

/// Scheduler over `service` with taps disabled unless a config is given.
pub fn scheduler_with(service: &Arc<FakeJobService>, config: PollConfig) -> Arc<PollScheduler> {
    let service: Arc<dyn JobService> = service.clone();
    PollScheduler::new(service, Arc::new(EventBus::default()), config)
}

pub fn scheduler(service: &Arc<FakeJobService>) -> Arc<PollScheduler> {
    scheduler_with(service, PollConfig::default().without_taps())
}
