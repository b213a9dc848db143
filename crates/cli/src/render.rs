//! Terminal tables for jobs, health and worker logs.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use jobwatch_client::{ServiceHealth, TerminalLogs};
use jobwatch_core::{JobCategory, JobRecord, JobStatus, Progress, RegistrySnapshot, Timestamp};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn status_cell(status: JobStatus) -> Cell {
    let color = match status {
        JobStatus::Queued => Color::Yellow,
        JobStatus::Running => Color::Cyan,
        JobStatus::Completed => Color::Green,
        JobStatus::Failed => Color::Red,
        JobStatus::Cancelled => Color::DarkGrey,
    };
    Cell::new(status).fg(color)
}

fn time(ts: Option<&Timestamp>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Short progress column: `3/10 (30.0%)`, or whatever part is known.
pub fn progress_summary(progress: &Progress) -> String {
    let counts = match (progress.current, progress.total) {
        (Some(current), Some(total)) => Some(format!("{current}/{total}")),
        (Some(current), None) => Some(current.to_string()),
        _ => None,
    };
    let percent = progress.percent().map(|p| format!("({p:.1}%)"));
    match (counts, percent) {
        (Some(c), Some(p)) => format!("{c} {p}"),
        (Some(c), None) => c,
        (None, Some(p)) => p,
        (None, None) => progress.message.clone().unwrap_or_default(),
    }
}

fn job_row(category: JobCategory, record: &JobRecord) -> Vec<Cell> {
    vec![
        Cell::new(category),
        Cell::new(&record.job_id),
        status_cell(record.status),
        Cell::new(time(Some(&record.started_at))),
        Cell::new(time(record.completed_at.as_ref())),
        Cell::new(record.progress.as_ref().map(progress_summary).unwrap_or_default()),
        Cell::new(record.error.as_deref().unwrap_or_default()),
    ]
}

/// Jobs of `categories` in registry order.
pub fn jobs_table(snapshot: &RegistrySnapshot, categories: &[JobCategory]) -> Table {
    let mut table = table();
    table.set_header(vec![
        "Category", "Job ID", "Status", "Started", "Completed", "Progress", "Error",
    ]);
    for &category in categories {
        for record in snapshot.category(category) {
            table.add_row(job_row(category, record));
        }
    }
    table
}

/// Field/value view of a single job.
pub fn job_detail(category: JobCategory, record: &JobRecord) -> Table {
    let mut table = table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Category"), Cell::new(category.label())]);
    table.add_row(vec![Cell::new("Job ID"), Cell::new(&record.job_id)]);
    table.add_row(vec![Cell::new("Status"), status_cell(record.status)]);
    table.add_row(vec!["Started", time(Some(&record.started_at)).as_str()]);
    table.add_row(vec!["Completed", time(record.completed_at.as_ref()).as_str()]);
    if let Some(progress) = &record.progress {
        table.add_row(vec!["Progress", progress_summary(progress).as_str()]);
        if let Some(message) = &progress.message {
            table.add_row(vec!["Phase", message.as_str()]);
        }
    }
    if let Some(error) = &record.error {
        table.add_row(vec![Cell::new("Error"), Cell::new(error).fg(Color::Red)]);
    }
    table
}

pub fn health_table(health: &ServiceHealth) -> Table {
    let mut table = table();
    table.set_header(vec!["Category", "Active", "Total"]);
    for category in JobCategory::ALL {
        let count = |n: Option<u64>| n.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        table.add_row(vec![
            category.label().to_string(),
            count(health.active(category)),
            count(health.total(category)),
        ]);
    }
    table
}

pub fn logs_table(logs: &TerminalLogs) -> Table {
    let mut table = table();
    table.set_header(vec!["#", "Time", "Level", "Message"]);
    for entry in &logs.logs {
        let level = match entry.level.to_ascii_lowercase().as_str() {
            "error" => Cell::new(&entry.level).fg(Color::Red),
            "warning" | "warn" => Cell::new(&entry.level).fg(Color::Yellow),
            _ => Cell::new(&entry.level),
        };
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(time(entry.timestamp.as_ref())),
            level,
            Cell::new(&entry.message),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_summary_uses_known_parts() {
        let full = Progress {
            current: Some(3),
            total: Some(10),
            percentage: Some(30.0),
            ..Progress::default()
        };
        assert_eq!(progress_summary(&full), "3/10 (30.0%)");

        let derived = Progress {
            current: Some(1),
            total: Some(4),
            ..Progress::default()
        };
        assert_eq!(progress_summary(&derived), "1/4 (25.0%)");

        let message_only = Progress {
            message: Some("Loading profiles".into()),
            ..Progress::default()
        };
        assert_eq!(progress_summary(&message_only), "Loading profiles");
    }
}
