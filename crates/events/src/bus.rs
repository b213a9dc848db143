//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`JobEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the orchestrator and
//! its observers.

use chrono::{DateTime, Utc};
use jobwatch_core::{JobCategory, JobId, JobStatus, Progress, RegistryChange};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A change in tracked job state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A category's listing was fetched and applied.
    CategoryRefreshed {
        category: JobCategory,
        job_count: usize,
        live_count: usize,
    },

    /// A background refresh failed; the last known records were kept.
    RefreshFailed { category: JobCategory, error: String },

    JobAdded {
        category: JobCategory,
        job_id: JobId,
        status: JobStatus,
    },

    JobStatusChanged {
        category: JobCategory,
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// The job no longer appears in its category's listing.
    JobRemoved {
        category: JobCategory,
        job_id: JobId,
        last_status: JobStatus,
    },

    ProgressUpdated {
        category: JobCategory,
        job_id: JobId,
        progress: Progress,
    },

    /// A result payload was fetched and attached to the job's record.
    ResultsAttached { category: JobCategory, job_id: JobId },

    /// The initial load gave up after its retries. Published at most once.
    InitialLoadFailed {
        categories: Vec<JobCategory>,
        message: String,
    },
}

impl JobEvent {
    /// Translate a registry diff entry for `category` into an event.
    pub fn from_change(category: JobCategory, change: RegistryChange) -> Self {
        match change {
            RegistryChange::Added { job_id, status } => Self::JobAdded {
                category,
                job_id,
                status,
            },
            RegistryChange::StatusChanged { job_id, from, to } => Self::JobStatusChanged {
                category,
                job_id,
                from,
                to,
            },
            RegistryChange::Removed {
                job_id,
                last_status,
            } => Self::JobRemoved {
                category,
                job_id,
                last_status,
            },
        }
    }

    /// Category the event concerns; `None` for cross-category events.
    pub fn category(&self) -> Option<JobCategory> {
        match self {
            Self::CategoryRefreshed { category, .. }
            | Self::RefreshFailed { category, .. }
            | Self::JobAdded { category, .. }
            | Self::JobStatusChanged { category, .. }
            | Self::JobRemoved { category, .. }
            | Self::ProgressUpdated { category, .. }
            | Self::ResultsAttached { category, .. } => Some(*category),
            Self::InitialLoadFailed { .. } => None,
        }
    }
}

/// A [`JobEvent`] stamped with its publication time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: JobEvent,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`JobEvent`].
///
/// # Usage
///
/// ```rust
/// use jobwatch_core::JobCategory;
/// use jobwatch_events::{EventBus, JobEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(JobEvent::CategoryRefreshed {
///     category: JobCategory::Scrape,
///     job_count: 3,
///     live_count: 1,
/// });
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<TimedEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.sender.send(TimedEvent {
            at: Utc::now(),
            event,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
