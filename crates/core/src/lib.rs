//! Domain types for tracking remote jobs.
//!
//! Holds the closed set of job categories, the job record shape reported
//! by the remote job service, and the in-memory [`Registry`] that the
//! orchestrator refreshes and presentation layers read snapshots from.

pub mod category;
pub mod error;
pub mod job;
pub mod live;
pub mod progress;
pub mod registry;
pub mod timestamp;

pub use category::JobCategory;
pub use error::CoreError;
pub use job::{JobId, JobKey, JobRecord, JobStatus};
pub use live::LiveSet;
pub use progress::Progress;
pub use registry::{
    PatchOutcome, RefreshOutcome, RefreshTicket, Registry, RegistryChange, RegistrySnapshot,
};
pub use timestamp::Timestamp;
