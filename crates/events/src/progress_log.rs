//! Progress mirroring service.
//!
//! [`ProgressLog`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes progress and status changes of tracked jobs to the log. It
//! runs as a long-lived background task, decoupled from the refresh logic,
//! and shuts down when the bus is dropped.

use jobwatch_core::Progress;
use tokio::sync::broadcast;

use crate::bus::{JobEvent, TimedEvent};

/// Background observer that logs job progress.
pub struct ProgressLog;

impl ProgressLog {
    /// Run the logging loop until the channel closes.
    pub async fn run(mut receiver: broadcast::Receiver<TimedEvent>) {
        loop {
            match receiver.recv().await {
                Ok(timed) => Self::log(&timed.event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Progress log lagged, some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, progress log shutting down");
                    break;
                }
            }
        }
    }

    fn log(event: &JobEvent) {
        match event {
            JobEvent::ProgressUpdated {
                category,
                job_id,
                progress,
            } => {
                tracing::info!(
                    category = %category,
                    "{}",
                    format_progress_line(job_id.as_str(), progress)
                );
            }
            JobEvent::JobStatusChanged {
                category,
                job_id,
                from,
                to,
            } => {
                tracing::info!(
                    category = %category,
                    job_id = %job_id,
                    from = %from,
                    to = %to,
                    "Job status changed"
                );
            }
            JobEvent::JobAdded {
                category,
                job_id,
                status,
            } => {
                tracing::info!(
                    category = %category,
                    job_id = %job_id,
                    status = %status,
                    "Job discovered"
                );
            }
            JobEvent::JobRemoved {
                category, job_id, ..
            } => {
                tracing::info!(category = %category, job_id = %job_id, "Job removed");
            }
            _ => {}
        }
    }
}

/// Render a progress report as `[job_id] message - current/total (pct%)`.
///
/// Parts whose fields are missing are left out, so a message-only report
/// renders as `[job_id] message`. The percentage is rounded to one decimal.
pub fn format_progress_line(job_id: &str, progress: &Progress) -> String {
    let mut line = format!("[{job_id}]");
    if let Some(message) = progress.message.as_deref().filter(|m| !m.is_empty()) {
        line.push(' ');
        line.push_str(message);
    }

    let counts = match (progress.current, progress.total) {
        (Some(current), Some(total)) => Some(format!("{current}/{total}")),
        (Some(current), None) => Some(current.to_string()),
        _ => None,
    };
    let percent = progress
        .percent()
        .map(|p| format!("({}%)", (p * 10.0).round() / 10.0));

    let tail: Vec<String> = counts.into_iter().chain(percent).collect();
    if !tail.is_empty() {
        line.push_str(" - ");
        line.push_str(&tail.join(" "));
    }
    line
}
