//! Job identity, status and the record shape reported by the job service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::JobCategory;
use crate::error::CoreError;
use crate::progress::{self, Progress};
use crate::timestamp::Timestamp;

/// Identifier assigned to a job by the remote service.
///
/// Unique within a category only; use [`JobKey`] for a globally unique
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for JobId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JobId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Globally unique job identity: `(category, job_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub category: JobCategory,
    pub job_id: JobId,
}

impl JobKey {
    pub fn new(category: JobCategory, job_id: impl Into<JobId>) -> Self {
        Self {
            category,
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.job_id)
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Queued and running jobs are live and get the tighter poll cadence.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// One job as last reported by the remote service.
///
/// `results` is never read from the wire: it is attached locally after an
/// explicit results fetch and discarded by the next refresh of the
/// category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: Timestamp,
    #[serde(default, with = "crate::timestamp::option")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "progress::deserialize_non_empty")]
    pub progress: Option<Progress>,
    /// Failure detail; only meaningful when `status` is `failed`.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

impl JobRecord {
    /// A record with only the required fields set.
    pub fn new(job_id: impl Into<JobId>, status: JobStatus, started_at: Timestamp) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            started_at,
            completed_at: None,
            progress: None,
            error: None,
            results: None,
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}
