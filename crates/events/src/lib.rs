//! Job event bus and observers.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`JobEvent`]: what changed in the job registry, published by the
//!   orchestrator after every applied refresh or progress patch.
//! - [`ProgressLog`]: background observer that mirrors progress and status
//!   changes into the log.

pub mod bus;
pub mod progress_log;

pub use bus::{EventBus, JobEvent, TimedEvent};
pub use progress_log::{format_progress_line, ProgressLog};
