//! Error taxonomy for calls against the job service.

/// Errors from the job service request layer.
///
/// Every variant is a failed call: the client performs no retries, so
/// callers decide whether a failure is absorbed or surfaced.
#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    /// The service could not be reached (connection refused, DNS, TLS).
    #[error("job service unreachable: {0}")]
    Unreachable(String),

    /// No response within the per-request deadline.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The job id is unknown to the service.
    #[error("job '{0}' not found")]
    NotFound(String),

    /// Results were requested for a job that has not completed.
    #[error("job '{job_id}' is not ready: {detail}")]
    NotReady { job_id: String, detail: String },

    /// The job is in a state that does not allow the operation.
    #[error("invalid state for job '{job_id}': {detail}")]
    InvalidState { job_id: String, detail: String },

    /// Any other non-2xx response.
    #[error("job service error ({status}): {detail}")]
    RemoteError { status: u16, detail: String },

    /// A 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl JobServiceError {
    /// Status code of the remote response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::NotReady { .. } | Self::InvalidState { .. } => Some(400),
            Self::RemoteError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failures of the transport rather than refusals by the service.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout { .. })
    }
}
