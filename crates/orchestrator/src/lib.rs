//! Client-side polling orchestrator for remote jobs.
//!
//! - [`PollScheduler`]: initial load with backoff, the baseline and live
//!   refresh cycles, and per-job progress taps.
//! - [`CommandDispatcher`]: cancel, delete, start and result fetches, each
//!   followed by a refresh of the affected category.
//! - [`PollConfig`]: cadences and retry policy, loaded from the environment.

pub mod backoff;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod scheduler;

pub use backoff::BackoffConfig;
pub use config::PollConfig;
pub use dispatcher::CommandDispatcher;
pub use error::InitialLoadError;
pub use scheduler::PollScheduler;
