//! Request layer for the remote job service.
//!
//! - [`JobService`]: the per-category operations the orchestrator depends on.
//! - [`JobServiceClient`]: the [`reqwest`] implementation, plus the
//!   administrative calls (health, terminal logs, emergency restart).
//! - [`JobServiceError`]: the error taxonomy shared by every call.
//! - [`start`]: typed start configurations per category.

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod start;

pub use admin::{LogEntry, ServiceHealth, TerminalLogs};
pub use config::{ClientConfig, ConfigError};
pub use error::JobServiceError;
pub use http::JobServiceClient;
pub use service::{Ack, JobService};
pub use start::{
    CleanConfig, ExtractionConfig, InferConfig, ScrapeConfig, StartConfig, StartRequest,
    StartedJob, UpdateConfig,
};
