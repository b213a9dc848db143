//! Typed start requests, one configuration shape per job category.
//!
//! Defaults mirror what the job service assumes when a field is omitted,
//! so a default configuration starts the same job the service would start
//! for an empty request body.

use jobwatch_core::{JobCategory, JobId, JobStatus};
use serde::{Deserialize, Serialize};

/// Configuration for a LinkedIn URL extraction job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Airtable field names checked for LinkedIn URLs.
    pub linkedin_fields: Vec<String>,
    pub event_filter: Option<String>,
    pub top_100_filter: Option<bool>,
    /// Prefix for output filenames.
    pub output_prefix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            linkedin_fields: vec!["4. CEO LinkedIn".to_string()],
            event_filter: Some("S25".to_string()),
            top_100_filter: Some(true),
            output_prefix: "test".to_string(),
        }
    }
}

/// Configuration for a profile scrape job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub urls_file: String,
    pub output_file: String,
    /// URLs submitted per batch.
    pub batch_size: u32,
    /// Limit the run to `test_num_urls` URLs.
    pub test_mode: bool,
    pub test_num_urls: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            urls_file: "airtable-extractions/S25Top100linkedin_urls_for_apify.json".to_string(),
            output_file: "apify-profile-data/S25Top100linkedin_profile_data.json".to_string(),
            batch_size: 50,
            test_mode: false,
            test_num_urls: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub input_file: String,
    pub output_file: String,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input_file: "apify-profile-data/S25Top100linkedin_profile_data.json".to_string(),
            output_file: "cleaned-profile-data/S25Top100cleaned_linkedin_data.json".to_string(),
        }
    }
}

/// Configuration for a trait inference job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferConfig {
    pub input_file: String,
    pub output_file: String,
    /// `-1` processes every profile.
    pub max_profiles: i64,
    pub force_reextraction: bool,
    /// Seconds between model calls.
    pub delay_between_calls: f64,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            input_file: "cleaned-profile-data/S25Top100cleaned_linkedin_data.json".to_string(),
            output_file: "final-trait-extractions/S25Top100_comprehensive_traits.json".to_string(),
            max_profiles: -1,
            force_reextraction: false,
            delay_between_calls: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub traits_file: String,
    pub url_mapping_file: String,
    /// Seconds between record updates.
    pub delay_between_updates: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            traits_file: "final-trait-extractions/S25Top100_comprehensive_traits.json".to_string(),
            url_mapping_file: "airtable-extractions/S25Top100airtable_url_mapping.json"
                .to_string(),
            delay_between_updates: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// StartConfig
// ---------------------------------------------------------------------------

/// Category-specific start configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StartConfig {
    Extraction(ExtractionConfig),
    Scrape(ScrapeConfig),
    Clean(CleanConfig),
    Infer(InferConfig),
    Update(UpdateConfig),
}

impl StartConfig {
    /// The service defaults for `category`.
    pub fn default_for(category: JobCategory) -> Self {
        match category {
            JobCategory::Extraction => Self::Extraction(ExtractionConfig::default()),
            JobCategory::Scrape => Self::Scrape(ScrapeConfig::default()),
            JobCategory::Clean => Self::Clean(CleanConfig::default()),
            JobCategory::Infer => Self::Infer(InferConfig::default()),
            JobCategory::Update => Self::Update(UpdateConfig::default()),
        }
    }

    /// Decode a partial JSON object; omitted fields take their defaults.
    pub fn from_json(
        category: JobCategory,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match category {
            JobCategory::Extraction => Self::Extraction(serde_json::from_value(value)?),
            JobCategory::Scrape => Self::Scrape(serde_json::from_value(value)?),
            JobCategory::Clean => Self::Clean(serde_json::from_value(value)?),
            JobCategory::Infer => Self::Infer(serde_json::from_value(value)?),
            JobCategory::Update => Self::Update(serde_json::from_value(value)?),
        })
    }

    pub fn category(&self) -> JobCategory {
        match self {
            Self::Extraction(_) => JobCategory::Extraction,
            Self::Scrape(_) => JobCategory::Scrape,
            Self::Clean(_) => JobCategory::Clean,
            Self::Infer(_) => JobCategory::Infer,
            Self::Update(_) => JobCategory::Update,
        }
    }
}

/// Body of a start call: `{"config": {...}, "job_id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartRequest {
    pub config: StartConfig,
    /// Caller-chosen id; the service generates one when absent.
    pub job_id: Option<JobId>,
}

impl StartRequest {
    pub fn new(config: StartConfig) -> Self {
        Self {
            config,
            job_id: None,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn category(&self) -> JobCategory {
        self.config.category()
    }
}

/// Acknowledgement returned by a start endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedJob {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
}
