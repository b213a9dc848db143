//! Administrative responses outside the per-category job protocol.

use std::collections::BTreeMap;

use jobwatch_core::{JobCategory, Timestamp};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
///
/// Per-category counters arrive as flat `active_*` / `total_*` fields;
/// they land in `counts` with any other extra field and read through
/// [`ServiceHealth::active`] and [`ServiceHealth::total`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default, with = "jobwatch_core::timestamp::option")]
    pub timestamp: Option<Timestamp>,
    #[serde(flatten)]
    pub counts: BTreeMap<String, serde_json::Value>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }

    /// Running jobs of `category`, as counted by the service.
    pub fn active(&self, category: JobCategory) -> Option<u64> {
        self.counter(&format!("active_{}", count_key(category)))
    }

    /// All jobs of `category` the service still holds.
    pub fn total(&self, category: JobCategory) -> Option<u64> {
        self.counter(&format!("total_{}", count_key(category)))
    }

    fn counter(&self, key: &str) -> Option<u64> {
        self.counts.get(key).and_then(serde_json::Value::as_u64)
    }
}

fn count_key(category: JobCategory) -> &'static str {
    match category {
        JobCategory::Extraction => "jobs",
        JobCategory::Scrape => "apify_jobs",
        JobCategory::Clean => "cleaner_jobs",
        JobCategory::Infer => "trait_jobs",
        JobCategory::Update => "airtable_updater_jobs",
    }
}

/// One line of the remote worker log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(default, with = "jobwatch_core::timestamp::option")]
    pub timestamp: Option<Timestamp>,
    pub level: String,
    pub message: String,
}

/// Body of `GET /terminal-logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalLogs {
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub total_logs: u64,
    /// Retention cap on the service side.
    #[serde(default)]
    pub max_logs: Option<u64>,
}
