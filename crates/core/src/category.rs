//! The closed set of job categories tracked by the dashboard.
//!
//! Every category shares the same lifecycle shape on the remote service;
//! only the path prefix and the start endpoint differ.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kind of remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    /// LinkedIn URL extraction from the source table.
    Extraction,
    /// Third-party profile scraping.
    Scrape,
    /// Cleaning of scraped profile data.
    Clean,
    /// Trait inference over cleaned profiles.
    Infer,
    /// Writing inferred traits back to the source records.
    Update,
}

impl JobCategory {
    /// All categories, in the order a full refresh visits them.
    pub const ALL: [JobCategory; 5] = [
        JobCategory::Extraction,
        JobCategory::Scrape,
        JobCategory::Clean,
        JobCategory::Infer,
        JobCategory::Update,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::Scrape => "scrape",
            Self::Clean => "clean",
            Self::Infer => "infer",
            Self::Update => "update",
        }
    }

    /// Human-readable label for tables and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Extraction => "URL extraction",
            Self::Scrape => "Profile scraping",
            Self::Clean => "Data cleaning",
            Self::Infer => "Trait inference",
            Self::Update => "Record update",
        }
    }

    /// Position in [`JobCategory::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Path prefix of the category's endpoint family on the remote service.
    ///
    /// Extraction jobs live at the service root, every other category is
    /// nested under its own segment.
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Extraction => "",
            Self::Scrape => "/apify",
            Self::Clean => "/cleaner",
            Self::Infer => "/traits",
            Self::Update => "/airtable",
        }
    }

    /// Path of the endpoint that starts a new job of this category.
    pub fn start_path(self) -> &'static str {
        match self {
            Self::Extraction => "/extract",
            Self::Scrape => "/apify/process",
            Self::Clean => "/cleaner/process",
            Self::Infer => "/traits/process",
            Self::Update => "/airtable/update",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCategory {
    type Err = CoreError;

    /// Accepts the canonical names as well as the remote service's path
    /// segment names (`apify`, `cleaner`, `traits`, `airtable`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extraction" | "extract" => Ok(Self::Extraction),
            "scrape" | "apify" => Ok(Self::Scrape),
            "clean" | "cleaner" => Ok(Self::Clean),
            "infer" | "traits" => Ok(Self::Infer),
            "update" | "airtable" => Ok(Self::Update),
            _ => Err(CoreError::UnknownCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
